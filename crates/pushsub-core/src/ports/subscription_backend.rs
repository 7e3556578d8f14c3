//! Subscription backend port (driven/secondary port)
//!
//! Binds and unbinds a delivery token to the shared notification topic.
//!
//! ## Design Notes
//!
//! - Transport failures are `Err`. Any HTTP response whose body could be
//!   read is `Ok(Ack)`, including 4xx/5xx, so the server's own error
//!   message reaches the user verbatim.
//! - A bind or unbind only counts as done when [`Ack::is_confirmed`]:
//!   2xx status AND `success: true`.
//! - No retries here; the orchestrator owns the overall attempt.

use serde::{Deserialize, Serialize};

use crate::domain::SubscriptionToken;

/// Backend reply to a bind or unbind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// HTTP status code
    pub status: u16,
    /// `success` flag from the body (false if absent)
    pub success: bool,
    /// Optional informational message
    pub message: Option<String>,
    /// Optional server error message
    pub error: Option<String>,
}

impl Ack {
    /// Creates a confirmed 200 acknowledgement
    pub fn confirmed(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Creates a rejection with the given status and server error
    pub fn rejected(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if the status is 2xx AND the body reports success
    pub fn is_confirmed(&self) -> bool {
        (200..300).contains(&self.status) && self.success
    }

    /// Server-reported reason for a non-confirmed reply
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| format!("Server responded with status {}", self.status))
    }
}

/// Port trait for the bind/unbind endpoints
#[async_trait::async_trait]
pub trait ISubscriptionBackend: Send + Sync {
    /// Binds `token` to the shared topic
    async fn bind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack>;

    /// Unbinds `token` from the shared topic
    async fn unbind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack>;
}
