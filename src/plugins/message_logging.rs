use crate::models::Job;

use super::{Plugin, PluginContext, PluginFuture};

/// Upserts the group record and persists the message, requiring both a
/// chat id and a message id. Never short-circuits. Ported from
/// `original_source/app/services/plugins/logging.py::MessageLoggingPlugin`.
pub struct MessageLoggingPlugin;

impl Plugin for MessageLoggingPlugin {
    fn name(&self) -> &'static str {
        "message_logging"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let (Some(chat_id), Some(message_id)) =
                (job.chat_id.as_deref(), job.message_id.as_deref())
            else {
                return Ok(false);
            };
            ctx.store.upsert_group(chat_id, None);
            ctx.store
                .save_message(chat_id, message_id, job.sender_id.as_deref(), job.text.as_deref());
            Ok(false)
        })
    }
}
