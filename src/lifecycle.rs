use std::sync::Arc;
use std::time::Instant;

use rocket::fairing::AdHoc;
use serde_json::json;

use crate::api_client::ApiClient;
use crate::commands::CommandRegistry;
use crate::config::Config;
use crate::janitor::spawn_janitor;
use crate::models::Job;
use crate::plugins::{PluginContext, PluginRegistry};
use crate::queue::JobQueue;
use crate::rate_limit::IngressRateLimiter;
use crate::router::{self, RouterState};
use crate::stats::Stats;
use crate::store::Store;
use crate::worker::{Handler, WorkerPool};

/// Wires every component together and returns an unlaunched Rocket instance,
/// following the teacher crate's `lib.rs::build_rocket` shape: construct
/// managed state, attach startup fairings for background tasks, mount
/// routes. Ported in structure (not content) from
/// `original_source/app/main.py::create_app` / `app/core/lifecycle.py`.
pub fn build_rocket(config: Config) -> rocket::Rocket<rocket::Build> {
    let db_path = config.resolve_db_path();
    let store = Arc::new(Store::new(
        &db_path,
        config.settings_cache_size,
        config.settings_cache_ttl_seconds,
    ));

    let api = Arc::new(ApiClient::new(
        &config.api_base_url,
        &config.bot_token,
        config.api_timeout_seconds,
        config.api_rate_limit_per_second,
        config.api_retry_attempts,
        config.api_retry_backoff_seconds,
    ));

    let stats = Arc::new(Stats::new());
    let commands = Arc::new(CommandRegistry::with_default_commands());
    let registry = Arc::new(PluginRegistry::with_default_chain());

    let plugin_ctx = Arc::new(PluginContext {
        store: store.clone(),
        api: api.clone(),
        commands: commands.clone(),
        owner_id: config.owner_id.clone(),
        report_anti_actions: config.report_anti_actions,
        stats: stats.clone(),
        incoming_updates_enabled: config.incoming_updates_enabled,
        incoming_updates_store_raw: config.incoming_updates_store_raw,
    });

    let queue = Arc::new(JobQueue::new(
        config.queue_max_size,
        config.queue_full_policy,
        config.dedup_ttl_seconds,
        stats.clone(),
    ));

    let handler = build_handler(registry, plugin_ctx, stats.clone());
    let workers = Arc::new(WorkerPool::spawn(queue.clone(), config.worker_concurrency, handler));

    spawn_janitor(
        store.clone(),
        config.incoming_updates_enabled,
        config.incoming_updates_retention_hours as f64 * 3600.0,
        config.messages_keep_per_chat,
    );

    let router_state = RouterState {
        queue: queue.clone(),
        ingress_limiter: IngressRateLimiter::new(config.rate_limit_per_minute, 60),
        webhook_secret: config.webhook_secret.clone(),
        stats: stats.clone(),
        workers: workers.clone(),
    };

    let register_webhook = config.register_webhook;
    let webhook_base_url = config.webhook_base_url.clone();
    let startup_api = api.clone();

    rocket::build()
        .manage(router_state)
        .register("/", rocket::catchers![router::not_found, router::too_many_requests])
        .mount(
            "/",
            rocket::routes![
                router::receive_update,
                router::receive_inline_message,
                router::health,
                router::health_queue,
                router::drain_queue,
            ],
        )
        .attach(AdHoc::on_liftoff("Webhook Registration", move |_rocket| {
            Box::pin(async move {
                let Some(base_url) = webhook_base_url.filter(|_| register_webhook) else {
                    return;
                };
                let update_result = startup_api
                    .update_bot_endpoints(&format!("{base_url}/receiveUpdate"), "ReceiveUpdate")
                    .await;
                let inline_result = startup_api
                    .update_bot_endpoints(
                        &format!("{base_url}/receiveInlineMessage"),
                        "ReceiveInlineMessage",
                    )
                    .await;
                if !update_result.ok || !inline_result.ok {
                    eprintln!("webhook registration failed: {update_result:?} {inline_result:?}");
                }
                let commands = json!([
                    { "command": "help" },
                    { "command": "ping" },
                ]);
                startup_api.set_commands(commands).await;
                println!("webhook registration complete: {base_url}");
            })
        }))
}

/// Wraps the plugin chain into the worker pool's `Handler` contract,
/// recording dispatch timing and error state on `Stats` (§4.5, §4.8, §4.9).
fn build_handler(
    registry: Arc<PluginRegistry>,
    plugin_ctx: Arc<PluginContext>,
    stats: Arc<Stats>,
) -> Handler {
    Arc::new(move |job: Job| {
        let registry = registry.clone();
        let plugin_ctx = plugin_ctx.clone();
        let stats = stats.clone();
        Box::pin(async move {
            let start = Instant::now();
            let result = registry.dispatch(&plugin_ctx, &job).await;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            stats.record_dispatch(elapsed_ms, result.is_err());
            result.map_err(|err| err.to_string())
        })
    })
}
