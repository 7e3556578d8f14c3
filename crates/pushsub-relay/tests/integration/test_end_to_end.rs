//! Client → relay → provider round trips over real sockets

use pushsub_client::client::SubscriptionClient;
use pushsub_client::ClientError;
use pushsub_core::api::NotificationRequest;
use pushsub_core::domain::SubscriptionToken;
use pushsub_core::ports::ISubscriptionBackend;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn test_bind_and_unbind_through_relay() {
    let (provider, messaging) = common::setup_provider_mock().await;
    common::mount_batch(&provider, "batchAdd", json!([{}])).await;
    common::mount_batch(&provider, "batchRemove", json!([{}])).await;

    let relay = common::start_relay(messaging).await;
    let client = SubscriptionClient::with_base_url(&relay.base_url).with_api_key(common::RELAY_KEY);
    let token = SubscriptionToken::new("tok-123").unwrap();

    let ack = client.bind(&token).await.expect("bind transport");
    assert!(ack.is_confirmed());
    assert_eq!(ack.message.as_deref(), Some("Subscribed to topic: all-users"));

    let ack = client.unbind(&token).await.expect("unbind transport");
    assert!(ack.is_confirmed());
    assert_eq!(
        ack.message.as_deref(),
        Some("Unsubscribed from topic: all-users")
    );

    relay.shutdown.cancel();
    relay.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_wrong_key_is_rejected_before_provider() {
    let (provider, messaging) = common::setup_provider_mock().await;
    let relay = common::start_relay(messaging).await;
    let client = SubscriptionClient::with_base_url(&relay.base_url).with_api_key("wrong");

    let ack = client
        .bind(&SubscriptionToken::new("tok").unwrap())
        .await
        .unwrap();
    assert_eq!(ack.status, 401);
    assert_eq!(
        ack.failure_message(),
        "Unauthorized - Invalid or missing API key"
    );
    assert!(provider.received_requests().await.unwrap().is_empty());

    relay.shutdown.cancel();
}

#[tokio::test]
async fn test_send_through_relay() {
    let (provider, messaging) = common::setup_provider_mock().await;
    common::mount_send(&provider, "projects/demo-project/messages/7").await;

    let relay = common::start_relay(messaging).await;
    let client = SubscriptionClient::with_base_url(&relay.base_url).with_api_key(common::RELAY_KEY);

    let receipt = client
        .send_notification(&NotificationRequest::new("Hello", "World").with_url("/about"))
        .await
        .expect("send failed");
    assert_eq!(
        receipt.message_id.as_deref(),
        Some("projects/demo-project/messages/7")
    );
    assert_eq!(
        receipt.message.as_deref(),
        Some("Notification sent to topic: all-users")
    );

    let err = client
        .send_notification(&NotificationRequest::new("Hello", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::BadRequest(_)));

    relay.shutdown.cancel();
}
