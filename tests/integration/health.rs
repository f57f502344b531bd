use rocket::http::Status;

use crate::common::test_client;

#[tokio::test]
async fn test_health() {
    let client = test_client("http://127.0.0.1:0").await;
    let res = client.get("/health").dispatch().await;
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_health_queue_starts_empty() {
    let client = test_client("http://127.0.0.1:0").await;
    let res = client.get("/health/queue").dispatch().await;
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().await.unwrap();
    assert_eq!(body["queue"]["size"], 0);
    assert_eq!(body["queue"]["total_enqueued"], 0);
    assert!(body["workers"].as_array().unwrap().len() >= 1);
}

#[tokio::test]
async fn test_health_queue_drain_leaves_queue_empty() {
    let client = test_client("http://127.0.0.1:0").await;
    let body = crate::common::update_payload("c1", "m1", "u1", "hello there");
    client.post("/receiveUpdate").body(body).dispatch().await;

    let res = client.post("/health/queue/drain").dispatch().await;
    assert_eq!(res.status(), Status::Ok);

    // Whether the worker raced the drain or the drain won, the queue ends
    // up empty either way.
    let res = client.get("/health/queue").dispatch().await;
    let body: serde_json::Value = res.into_json().await.unwrap();
    assert_eq!(body["queue"]["size"], 0);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let client = test_client("http://127.0.0.1:0").await;
    let res = client.get("/no-such-route").dispatch().await;
    assert_eq!(res.status(), Status::NotFound);
    let body: serde_json::Value = res.into_json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}
