use crate::commands::parse_command;
use crate::models::Job;

use super::{Plugin, PluginContext, PluginFuture};

/// Parses a leading `/command` out of the message text, looks it up in the
/// registry, enforces `admin_only`, and runs the thin handler. Returns
/// `true` whenever a known command name was found — including the
/// permission-denied case — so nothing downstream (the panel plugin) also
/// reacts to it. Ported from
/// `original_source/app/services/plugins/commands.py::CommandsPlugin`.
pub struct CommandsPlugin;

impl Plugin for CommandsPlugin {
    fn name(&self) -> &'static str {
        "commands"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            let Some(text) = job.text.as_deref() else {
                return Ok(false);
            };
            let Some((name, args)) = parse_command(text) else {
                return Ok(false);
            };
            let Some(command) = ctx.commands.get(&name) else {
                return Ok(false);
            };

            if command.admin_only && !is_authorized(ctx, job) {
                if let Some(chat_id) = job.chat_id.as_deref() {
                    ctx.api
                        .send_message(chat_id, "You are not allowed to use this command.")
                        .await;
                }
                return Ok(true);
            }

            let reply = (command.handler)(
                ctx.store.clone(),
                ctx.api.clone(),
                job.clone(),
                args,
            )
            .await;

            if let (Some(chat_id), Some(text)) = (job.chat_id.as_deref(), reply.text.as_deref()) {
                ctx.api.send_message(chat_id, text).await;
            }
            Ok(true)
        })
    }
}

fn is_authorized(ctx: &PluginContext, job: &Job) -> bool {
    let Some(sender_id) = job.sender_id.as_deref() else {
        return false;
    };
    if ctx.owner_id.as_deref() == Some(sender_id) {
        return true;
    }
    let Some(chat_id) = job.chat_id.as_deref() else {
        return false;
    };
    ctx.store.is_admin(chat_id, sender_id)
}
