use crate::models::{IncomingUpdate, Job};

use super::{Plugin, PluginContext, PluginFuture};

/// Persists a raw snapshot of every admitted job for audit/debugging,
/// gated on the `incoming_updates_enabled` setting and optionally storing
/// the raw payload too. Always runs first and never short-circuits, per
/// `original_source/app/services/plugins/incoming_snapshot.py`.
pub struct IncomingSnapshotPlugin;

impl Plugin for IncomingSnapshotPlugin {
    fn name(&self) -> &'static str {
        "incoming_snapshot"
    }

    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a> {
        Box::pin(async move {
            if !ctx.incoming_updates_enabled {
                return Ok(false);
            }
            let store_raw = ctx.incoming_updates_store_raw;
            let update = IncomingUpdate {
                job_id: job.job_id.clone(),
                received_at: job.received_at,
                chat_id: job.chat_id.clone(),
                message_id: job.message_id.clone(),
                sender_id: job.sender_id.clone(),
                update_type: job.update_type.clone(),
                text: job.text.clone(),
                raw_payload: if store_raw {
                    Some(job.raw_payload.to_string())
                } else {
                    None
                },
            };
            ctx.store.save_incoming_update(&update).ok();
            Ok(false)
        })
    }
}
