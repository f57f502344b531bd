use std::sync::LazyLock;

use regex::Regex;

use crate::models::Job;

use super::{Plugin, PluginContext, PluginError, PluginFuture};

/// Matches bare/scheme URLs, `t.me`/`telegram.me`/`rubika.ir` short links, or
/// a generic `domain.<tld>` shape. Ported from
/// `original_source/app/utils/regex.py::LINK_PATTERN`.
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(https?://|www\.|t\.me/|telegram\.me/|rubika\.ir/|bit\.ly/|[a-z0-9-]+\.(ir|com|net|org|io|me|co|app|dev|ly)\b)",
    )
    .expect("valid link pattern")
});

const MODERATED_CHAT_TYPES: &[&str] = &["group", "supergroup", "channel"];

/// Deletes link-containing messages and bans the sender, unless the sender
/// is an admin or `anti_link` is disabled for the chat. Ported from
/// `original_source/app/services/plugins/anti_link.py::AntiLinkPlugin`.
pub struct AntiLinkPlugin;

impl Plugin for AntiLinkPlugin {
    fn name(&self) -> &'static str {
        "anti_link"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let Some(chat_id) = job.chat_id.as_deref() else {
                return Ok(false);
            };
            let chat_type = job
                .update_type
                .as_deref()
                .unwrap_or("")
                .to_lowercase();
            if !MODERATED_CHAT_TYPES.contains(&chat_type.as_str()) {
                return Ok(false);
            }

            let settings = ctx.store.get_group(chat_id);
            if !settings.anti_link {
                return Ok(false);
            }

            let Some(sender_id) = job.sender_id.as_deref() else {
                return Ok(false);
            };
            if ctx.owner_id.as_deref() == Some(sender_id) || ctx.store.is_admin(chat_id, sender_id)
            {
                return Ok(false);
            }

            let Some(text) = job.text.as_deref() else {
                return Ok(false);
            };
            if !LINK_PATTERN.is_match(text) {
                return Ok(false);
            }

            let Some(message_id) = job.message_id.as_deref() else {
                return Ok(false);
            };
            ctx.api.delete_message(chat_id, message_id).await;
            ctx.api.ban_chat_member(chat_id, sender_id).await;
            if ctx.report_anti_actions {
                ctx.api
                    .send_message(chat_id, "Link detected: message removed and sender banned.")
                    .await;
            }
            Ok(true)
        })
    }
}
