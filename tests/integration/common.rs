use rocket::local::asynchronous::Client;
use rubika_bot_core::Config;

/// Builds an unlaunched config pointed at a unique temp SQLite file, so
/// parallel tests never contend on the same database, mirroring the
/// teacher crate's per-test `/tmp/chat_test_<uuid>.db` convention.
fn test_db_path() -> String {
    format!(
        "/tmp/rubika_bot_core_test_{}.db",
        uuid::Uuid::new_v4().to_string().split('-').next().unwrap()
    )
}

/// A `Config` suitable for tests: webhook registration and signature
/// verification are off by default so a plain client can post updates
/// without standing up a fake Rubika endpoint, and `api_base_url` points
/// at the caller-supplied mock server so outbound calls (ban/delete/send)
/// land on `wiremock` instead of the real network.
pub fn test_config(api_base_url: &str) -> Config {
    Config {
        bot_token: "test-token".to_string(),
        owner_id: Some("owner-1".to_string()),
        webhook_secret: None,
        db_url: test_db_path(),
        api_base_url: api_base_url.to_string(),
        api_timeout_seconds: 5,
        api_retry_attempts: 0,
        api_retry_backoff_seconds: 0.0,
        api_rate_limit_per_second: 1000.0,
        webhook_base_url: None,
        worker_concurrency: 2,
        queue_max_size: 1000,
        queue_full_policy: rubika_bot_core::config::QueueFullPolicy::Reject,
        rate_limit_per_minute: 100_000,
        dedup_ttl_seconds: 120,
        settings_cache_ttl_seconds: 90,
        settings_cache_size: 1024,
        incoming_updates_enabled: true,
        incoming_updates_store_raw: false,
        incoming_updates_retention_hours: 48,
        messages_keep_per_chat: 10_000,
        register_webhook: false,
        report_anti_actions: true,
    }
}

/// Async local client (not the blocking variant) so tests can `.await`
/// alongside `wiremock`'s `MockServer` on the same Tokio runtime instead of
/// nesting one runtime inside another.
pub async fn test_client(api_base_url: &str) -> Client {
    let rocket = rubika_bot_core::build_rocket(test_config(api_base_url));
    Client::tracked(rocket).await.expect("valid rocket instance")
}

/// Same as [`test_client`], but with a tight queue so overflow behavior is
/// reachable without posting thousands of updates.
pub async fn test_client_with_queue_size(api_base_url: &str, queue_max_size: usize) -> Client {
    let mut config = test_config(api_base_url);
    config.queue_max_size = queue_max_size;
    let rocket = rubika_bot_core::build_rocket(config);
    Client::tracked(rocket).await.expect("valid rocket instance")
}

/// Polls `/health/queue` until both sub-queues drain or `attempts` is
/// exhausted, giving the worker pool time to dispatch a just-enqueued job
/// without a fixed sleep.
pub async fn wait_until_queue_empty(client: &Client) {
    for _ in 0..50 {
        let res = client.get("/health/queue").dispatch().await;
        let body: serde_json::Value = res.into_json().await.unwrap();
        if body["queue"]["size"].as_i64() == Some(0) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("queue did not drain in time");
}

pub fn update_payload(chat_id: &str, message_id: &str, sender_id: &str, text: &str) -> String {
    serde_json::json!({
        "update_id": format!("u-{message_id}"),
        "message": {
            "message_id": message_id,
            "text": text,
            "sender_id": sender_id,
            "chat": { "id": chat_id, "type": "group" },
        }
    })
    .to_string()
}

/// A `callback_query` update tapping an inline keypad button: the tapped
/// button's payload arrives in the top-level `button_id` field, not inside
/// `message.text` (§4.11 step 5).
pub fn callback_query_payload(
    chat_id: &str,
    message_id: &str,
    sender_id: &str,
    button_data: &str,
) -> String {
    serde_json::json!({
        "update_id": format!("u-{message_id}"),
        "type": "callback_query",
        "button_id": button_data,
        "message": {
            "message_id": message_id,
            "sender_id": sender_id,
            "chat": { "id": chat_id, "type": "group" },
        }
    })
    .to_string()
}
