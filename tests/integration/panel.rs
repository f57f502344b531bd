use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{callback_query_payload, test_client, wait_until_queue_empty};

#[tokio::test]
async fn test_panel_callback_toggles_flag_via_button_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test-token/editInlineKeypad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri()).await;
    let body = callback_query_payload("c1", "m1", "owner-1", "panel:anti_flood");
    let res = client.post("/receiveUpdate").body(body).dispatch().await;
    assert_eq!(res.status(), rocket::http::Status::Ok);

    wait_until_queue_empty(&client).await;

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .any(|r| r.url.path() == "/test-token/editInlineKeypad"));
}
