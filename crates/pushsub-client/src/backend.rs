//! Subscription backend adapter
//!
//! Implements [`ISubscriptionBackend`] over [`SubscriptionClient`] so the
//! orchestrator can bind and unbind through the relay.

use async_trait::async_trait;
use pushsub_core::domain::SubscriptionToken;
use pushsub_core::ports::{Ack, ISubscriptionBackend};

use crate::client::SubscriptionClient;

#[async_trait]
impl ISubscriptionBackend for SubscriptionClient {
    async fn bind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack> {
        Ok(self.bind_token(token).await?)
    }

    async fn unbind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack> {
        Ok(self.unbind_token(token).await?)
    }
}
