use rocket::http::Status;
use wiremock::MockServer;

use crate::common::{test_config, update_payload};

#[tokio::test]
async fn test_queue_full_reject_policy_drops_new_jobs() {
    let mock_server = MockServer::start().await;
    let mut config = test_config(&mock_server.uri());
    // No workers drain the queue, so its occupancy is deterministic.
    config.worker_concurrency = 0;
    config.queue_max_size = 1;
    let rocket = rubika_bot_core::build_rocket(config);
    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap();

    let first = client
        .post("/receiveUpdate")
        .body(update_payload("c1", "m1", "u1", "hello"))
        .dispatch()
        .await;
    assert_eq!(first.status(), Status::Ok);

    let second = client
        .post("/receiveUpdate")
        .body(update_payload("c1", "m2", "u1", "world"))
        .dispatch()
        .await;
    assert_eq!(second.status(), Status::ServiceUnavailable);
    let second_body: serde_json::Value = second.into_json().await.unwrap();
    assert_eq!(second_body["status"], "dropped");

    let res = client.get("/health/queue").dispatch().await;
    let body: serde_json::Value = res.into_json().await.unwrap();
    assert_eq!(body["queue"]["size"], 1);
    assert_eq!(body["queue"]["total_dropped"], 1);
}

#[tokio::test]
async fn test_ingress_rate_limit_returns_429_once_exhausted() {
    let mock_server = MockServer::start().await;
    let mut config = test_config(&mock_server.uri());
    config.worker_concurrency = 0;
    config.rate_limit_per_minute = 1;
    let rocket = rubika_bot_core::build_rocket(config);
    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap();

    let first = client
        .post("/receiveUpdate")
        .body(update_payload("c1", "m1", "u1", "hello"))
        .dispatch()
        .await;
    assert_eq!(first.status(), Status::Ok);

    let second = client
        .post("/receiveUpdate")
        .body(update_payload("c1", "m2", "u1", "world"))
        .dispatch()
        .await;
    assert_eq!(second.status(), Status::TooManyRequests);
    let body: serde_json::Value = second.into_json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");
}
