use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::Job;

use super::{Plugin, PluginContext, PluginError, PluginFuture};

const WINDOW_SECONDS: u64 = 8;

/// Per-`(chat_id, sender_id)` sliding window of recent message timestamps.
/// Ported from
/// `original_source/app/services/plugins/anti_flood.py::AntiFloodPlugin`,
/// which keys a `defaultdict(deque)` the same way.
pub struct AntiFloodPlugin {
    windows: Mutex<HashMap<(String, String), Vec<Instant>>>,
}

impl AntiFloodPlugin {
    pub fn new() -> Self {
        AntiFloodPlugin {
            windows: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for AntiFloodPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for AntiFloodPlugin {
    fn name(&self) -> &'static str {
        "anti_flood"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let (Some(chat_id), Some(sender_id)) =
                (job.chat_id.as_deref(), job.sender_id.as_deref())
            else {
                return Ok(false);
            };

            let settings = ctx.store.get_group(chat_id);
            if !settings.anti_flood {
                return Ok(false);
            }
            if ctx.owner_id.as_deref() == Some(sender_id) || ctx.store.is_admin(chat_id, sender_id)
            {
                return Ok(false);
            }

            let key = (chat_id.to_string(), sender_id.to_string());
            let now = Instant::now();
            let window = Duration::from_secs(WINDOW_SECONDS);
            let exceeded = {
                let mut windows = self.windows.lock().map_err(|e| PluginError(e.to_string()))?;
                let entries = windows.entry(key).or_default();
                entries.retain(|ts| now.duration_since(*ts) <= window);
                entries.push(now);
                entries.len() as i64 > settings.flood_limit
            };

            if !exceeded {
                return Ok(false);
            }

            if let Some(message_id) = job.message_id.as_deref() {
                ctx.api.delete_message(chat_id, message_id).await;
            }
            ctx.api.ban_chat_member(chat_id, sender_id).await;
            if ctx.report_anti_actions {
                ctx.api
                    .send_message(chat_id, "Flooding detected: sender banned.")
                    .await;
            }
            Ok(true)
        })
    }
}
