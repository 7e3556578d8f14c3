//! Topic messaging port (driven/secondary port)
//!
//! Server-side access to the push provider: topic membership for tokens
//! and fan-out of a message to every member of a topic. Implemented by the
//! relay's provider adapter.

use crate::domain::{PushMessage, SubscriptionToken};

/// Port trait for the push provider's topic API
#[async_trait::async_trait]
pub trait ITopicMessaging: Send + Sync {
    /// Adds `token` to `topic`
    async fn subscribe_to_topic(&self, token: &SubscriptionToken, topic: &str)
        -> anyhow::Result<()>;

    /// Removes `token` from `topic`
    async fn unsubscribe_from_topic(
        &self,
        token: &SubscriptionToken,
        topic: &str,
    ) -> anyhow::Result<()>;

    /// Sends `message` to every token subscribed to `topic`
    ///
    /// Returns the provider-assigned message id.
    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> anyhow::Result<String>;
}
