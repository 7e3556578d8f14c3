//! Push provider port (driven/secondary port)
//!
//! Issues the delivery token that addresses this device + app installation.
//!
//! ## Design Notes
//!
//! - Implementations may trigger the native permission prompt when the
//!   decision is still undetermined.
//! - A single call is a single attempt. Retrying belongs to
//!   [`TokenProvider`](crate::usecases::TokenProvider).
//! - The raw string is validated by the caller; an empty string counts as a
//!   failed attempt.

use super::agent_runtime::AgentHandle;

/// Port trait for the push provider's token API
#[async_trait::async_trait]
pub trait IPushProvider: Send + Sync {
    /// Requests a delivery token bound to the given active agent
    ///
    /// # Arguments
    /// * `agent` - The active background agent the token is issued for
    async fn get_token(&self, agent: &AgentHandle) -> anyhow::Result<String>;
}
