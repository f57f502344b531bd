use hmac::{Hmac, Mac};
use rocket::http::{Header, Status};
use serde_json::json;
use sha2::Sha256;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{test_client, update_payload, wait_until_queue_empty};

type HmacSha256 = Hmac<Sha256>;

#[tokio::test]
async fn test_ping_command_replies_pong() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri()).await;
    let body = update_payload("c1", "m1", "u1", "/ping");
    let res = client.post("/receiveUpdate").body(body).dispatch().await;
    assert_eq!(res.status(), Status::Ok);

    wait_until_queue_empty(&client).await;

    let requests = mock_server.received_requests().await.unwrap();
    let send = requests
        .iter()
        .find(|r| r.url.path() == "/test-token/sendMessage")
        .expect("sendMessage was called");
    let payload: serde_json::Value = serde_json::from_slice(&send.body).unwrap();
    assert_eq!(payload["text"], "pong");
    assert_eq!(payload["chat_id"], "c1");
}

#[tokio::test]
async fn test_duplicate_update_is_suppressed() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server.uri()).await;

    let body = update_payload("c1", "m1", "u1", "hello there");
    let first = client
        .post("/receiveUpdate")
        .body(body.clone())
        .dispatch()
        .await;
    assert_eq!(first.status(), Status::Ok);
    let first_body: serde_json::Value = first.into_json().await.unwrap();
    assert_eq!(first_body["status"], "enqueued");

    let second = client.post("/receiveUpdate").body(body).dispatch().await;
    assert_eq!(second.status(), Status::Ok);
    let second_body: serde_json::Value = second.into_json().await.unwrap();
    assert_eq!(second_body["status"], "duplicate");
}

#[tokio::test]
async fn test_invalid_json_body_is_rejected() {
    let mock_server = MockServer::start().await;
    let client = test_client(&mock_server.uri()).await;
    let res = client
        .post("/receiveUpdate")
        .body("not json")
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::BadRequest);
}

#[tokio::test]
async fn test_missing_signature_is_rejected_when_secret_configured() {
    let mock_server = MockServer::start().await;
    let mut config = crate::common::test_config(&mock_server.uri());
    config.webhook_secret = Some("s3cret".to_string());
    let rocket = rubika_bot_core::build_rocket(config);
    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap();

    let body = update_payload("c1", "m1", "u1", "hi");
    let res = client.post("/receiveUpdate").body(body).dispatch().await;
    assert_eq!(res.status(), Status::Unauthorized);
}

#[tokio::test]
async fn test_valid_signature_is_accepted() {
    let mock_server = MockServer::start().await;
    let mut config = crate::common::test_config(&mock_server.uri());
    config.webhook_secret = Some("s3cret".to_string());
    let rocket = rubika_bot_core::build_rocket(config);
    let client = rocket::local::asynchronous::Client::tracked(rocket)
        .await
        .unwrap();

    let body = update_payload("c1", "m1", "u1", "hi");
    let mut mac = HmacSha256::new_from_slice(b"s3cret").unwrap();
    mac.update(body.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let res = client
        .post("/receiveUpdate")
        .header(Header::new("X-Rubika-Signature", signature))
        .body(body)
        .dispatch()
        .await;
    assert_eq!(res.status(), Status::Ok);
}
