//! Notification send behaviour against a mock relay

use pushsub_client::ClientError;
use pushsub_core::api::NotificationRequest;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_send_returns_message_id() {
    let (server, client) = common::setup_relay_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/notifications"))
        .and(body_json(json!({
            "notificationTitle": "Vote open",
            "notificationBody": "Cast your vote",
            "url": "/voting"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Notification sent to topic: all-users",
            "messageId": "projects/demo/messages/42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = NotificationRequest::new("Vote open", "Cast your vote").with_url("/voting");
    let receipt = client.send_notification(&request).await.expect("send failed");
    assert_eq!(
        receipt.message_id.as_deref(),
        Some("projects/demo/messages/42")
    );
}

#[tokio::test]
async fn test_send_missing_fields_is_bad_request() {
    let (server, client) = common::setup_relay_mock().await;
    common::mount_post(
        &server,
        "/api/notifications",
        400,
        json!({ "success": false, "error": "Missing notificationTitle or notificationBody" }),
    )
    .await;

    let err = client
        .send_notification(&NotificationRequest::new("", ""))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ClientError::BadRequest(ref m) if m == "Missing notificationTitle or notificationBody")
    );
}

#[tokio::test]
async fn test_send_provider_failure_is_server_error() {
    let (server, client) = common::setup_relay_mock().await;
    common::mount_post(
        &server,
        "/api/notifications",
        500,
        json!({ "success": false, "error": "Requested entity was not found." }),
    )
    .await;

    let err = client
        .send_notification(&NotificationRequest::new("t", "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ServerError(_)));
    assert!(err.to_string().contains("Requested entity was not found."));
}
