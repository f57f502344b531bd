use std::sync::Arc;
use std::time::Duration;

use crate::store::Store;
use crate::time::wall_now;

/// Interval between janitor sweeps (seconds), per §4.12.
const JANITOR_INTERVAL_SECS: u64 = 600;

/// Background retention loop: on each tick, expires stale incoming-update
/// snapshots (if enabled) and trims every chat's message history down to
/// `messages_keep_per_chat`. Modeled on the teacher crate's
/// `retention.rs::spawn_retention_task` — a `tokio::spawn`ed loop with a
/// fixed sleep between sweeps — generalized to this spec's two sweep
/// targets instead of per-room message limits.
///
/// Ported from `original_source/app/core/janitor.py::Janitor.run`. Errors
/// from an individual sweep step are logged and never stop the loop (§4.12,
/// §7 "Janitor failure").
pub fn spawn_janitor(
    store: Arc<Store>,
    incoming_updates_enabled: bool,
    incoming_updates_retention_seconds: f64,
    messages_keep_per_chat: i64,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(JANITOR_INTERVAL_SECS)).await;
            run_sweep(
                &store,
                incoming_updates_enabled,
                incoming_updates_retention_seconds,
                messages_keep_per_chat,
            );
        }
    });
}

fn run_sweep(
    store: &Store,
    incoming_updates_enabled: bool,
    incoming_updates_retention_seconds: f64,
    messages_keep_per_chat: i64,
) {
    if incoming_updates_enabled {
        let removed = store.cleanup_incoming_updates(wall_now(), incoming_updates_retention_seconds);
        if removed > 0 {
            println!("janitor: removed {removed} stale incoming_updates snapshot(s)");
        }
    }

    let trimmed = store.trim_messages_per_chat(messages_keep_per_chat);
    if trimmed > 0 {
        println!("janitor: trimmed {trimmed} message row(s) across all chats");
    }
}
