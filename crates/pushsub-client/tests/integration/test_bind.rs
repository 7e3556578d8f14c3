//! Bind/unbind behaviour against a mock relay

use pushsub_core::domain::SubscriptionToken;
use pushsub_core::ports::ISubscriptionBackend;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn token() -> SubscriptionToken {
    SubscriptionToken::new("tok-123").unwrap()
}

#[tokio::test]
async fn test_bind_posts_token_and_confirms() {
    let (server, client) = common::setup_relay_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/subscribe"))
        .and(body_json(json!({ "token": "tok-123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Subscribed to topic: all-users"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.bind(&token()).await.expect("bind failed");
    assert!(ack.is_confirmed());
    assert_eq!(ack.message.as_deref(), Some("Subscribed to topic: all-users"));
}

#[tokio::test]
async fn test_bind_rejection_keeps_server_error() {
    let (server, client) = common::setup_relay_mock().await;
    common::mount_post(
        &server,
        "/api/subscribe",
        401,
        json!({ "success": false, "error": "Unauthorized - Invalid or missing API key" }),
    )
    .await;

    let ack = client.bind(&token()).await.expect("transport should succeed");
    assert!(!ack.is_confirmed());
    assert_eq!(ack.status, 401);
    assert_eq!(
        ack.failure_message(),
        "Unauthorized - Invalid or missing API key"
    );
}

#[tokio::test]
async fn test_unbind_needs_success_flag() {
    let (server, client) = common::setup_relay_mock().await;
    common::mount_post(&server, "/api/unsubscribe", 200, json!({ "success": false })).await;

    let ack = client.unbind(&token()).await.unwrap();
    assert!(!ack.is_confirmed());
    assert_eq!(ack.failure_message(), "Server responded with status 200");
}

#[tokio::test]
async fn test_non_json_body_is_not_confirmed() {
    let (server, client) = common::setup_relay_mock().await;
    Mock::given(method("POST"))
        .and(path("/api/unsubscribe"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let ack = client.unbind(&token()).await.unwrap();
    assert_eq!(ack.status, 502);
    assert!(!ack.is_confirmed());
}

#[tokio::test]
async fn test_unreachable_relay_is_transport_error() {
    let client = pushsub_client::client::SubscriptionClient::with_base_url("http://127.0.0.1:1");
    assert!(client.bind(&token()).await.is_err());
}
