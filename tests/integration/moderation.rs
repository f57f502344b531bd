use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{test_client, update_payload, wait_until_queue_empty};

#[tokio::test]
async fn test_anti_link_bans_sender_and_deletes_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test-token/deleteMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test-token/banChatMember"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test-token/sendMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri()).await;
    // anti_link defaults to enabled for groups the bot has never seen, and
    // the sender here is neither the configured owner nor a group admin.
    let body = update_payload("c1", "m1", "intruder", "join my group https://evil.example/x");
    let res = client.post("/receiveUpdate").body(body).dispatch().await;
    assert_eq!(res.status(), rocket::http::Status::Ok);

    wait_until_queue_empty(&client).await;

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().any(|r| r.url.path() == "/test-token/deleteMessage"));
    assert!(requests.iter().any(|r| r.url.path() == "/test-token/banChatMember"));
}

#[tokio::test]
async fn test_plain_message_is_not_moderated() {
    let mock_server = MockServer::start().await;

    let client = test_client(&mock_server.uri()).await;
    let body = update_payload("c2", "m1", "regular-user", "just saying hi, no links");
    client.post("/receiveUpdate").body(body).dispatch().await;

    wait_until_queue_empty(&client).await;

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}
