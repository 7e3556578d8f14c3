//! Provider adapter behaviour against a mock topic API

use pushsub_core::domain::{PushMessage, SubscriptionToken};
use pushsub_core::ports::ITopicMessaging;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn token() -> SubscriptionToken {
    SubscriptionToken::new("tok-123").unwrap()
}

#[tokio::test]
async fn test_subscribe_posts_batch_add() {
    let (server, messaging) = common::setup_provider_mock().await;

    Mock::given(method("POST"))
        .and(path("/iid/v1:batchAdd"))
        .and(body_json(json!({
            "to": "/topics/all-users",
            "registration_tokens": ["tok-123"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [{}] })))
        .expect(1)
        .mount(&server)
        .await;

    messaging
        .subscribe_to_topic(&token(), "all-users")
        .await
        .expect("subscribe failed");
}

#[tokio::test]
async fn test_per_token_error_is_failure() {
    let (server, messaging) = common::setup_provider_mock().await;
    common::mount_batch(&server, "batchRemove", json!([{ "error": "NOT_FOUND" }])).await;

    let err = messaging
        .unsubscribe_from_topic(&token(), "all-users")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "NOT_FOUND");
}

#[tokio::test]
async fn test_http_error_message_is_extracted() {
    let (server, messaging) = common::setup_provider_mock().await;
    Mock::given(method("POST"))
        .and(path("/iid/v1:batchAdd"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Authentication error (SERVER_ID)"
        })))
        .mount(&server)
        .await;

    let err = messaging
        .subscribe_to_topic(&token(), "all-users")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication error (SERVER_ID)");
}

#[tokio::test]
async fn test_send_returns_message_name() {
    let (server, messaging) = common::setup_provider_mock().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/demo-project/messages:send"))
        .and(body_json(json!({
            "message": {
                "topic": "all-users",
                "notification": { "title": "Vote", "body": "Open now" },
                "data": { "url": "/voting" },
                "webpush": { "notification": { "icon": "/logo.svg" } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo-project/messages/42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let message = PushMessage::new("Vote", "Open now")
        .with_icon("/logo.svg")
        .with_url("/voting");
    let id = messaging.send_to_topic("all-users", &message).await.unwrap();
    assert_eq!(id, "projects/demo-project/messages/42");
}

#[tokio::test]
async fn test_send_structured_error() {
    let (server, messaging) = common::setup_provider_mock().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/demo-project/messages:send"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let err = messaging
        .send_to_topic("all-users", &PushMessage::new("t", "b"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Requested entity was not found.");
}
