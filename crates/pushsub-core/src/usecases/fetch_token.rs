//! Token acquisition use case
//!
//! Obtains a delivery token from the push provider with a bounded retry
//! loop. The provider may show the native permission prompt as a side
//! effect, so the permission decision is re-read around every attempt.
//!
//! ## Retry policy
//!
//! - Transient provider errors are retried up to `max_attempts` times with a
//!   fixed delay between attempts (never after the last one).
//! - A denial observed at any point stops the loop immediately; the attempt
//!   count is frozen at the value it had when the denial was seen.
//! - A token is only handed out while permission is granted.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{FailureReason, PermissionState, RetryBudget, SubscriptionToken};
use crate::ports::{AgentHandle, IPermissionSource, IPushProvider};

/// A token together with the number of attempts it took
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: SubscriptionToken,
    pub attempts: u32,
}

/// Terminal outcome of a failed token-fetch sequence
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The user blocked notifications before or during the loop
    #[error("permission denied after {attempts} attempts")]
    PermissionDenied { attempts: u32 },

    /// The provider returned a token but no decision was ever made
    #[error("permission prompt dismissed after {attempts} attempts")]
    PermissionDismissed { attempts: u32 },

    /// Every attempt failed transiently
    #[error("no token after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl TokenError {
    /// Attempts made before the sequence stopped
    pub fn attempts(&self) -> u32 {
        match self {
            TokenError::PermissionDenied { attempts }
            | TokenError::PermissionDismissed { attempts }
            | TokenError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

impl From<TokenError> for FailureReason {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::PermissionDenied { .. } => FailureReason::PermissionDenied,
            TokenError::PermissionDismissed { .. } => FailureReason::PermissionDismissed,
            TokenError::Exhausted { attempts, .. } => {
                FailureReason::TokenFetchExhausted { attempts }
            }
        }
    }
}

/// Fetches delivery tokens with bounded retry
pub struct TokenProvider {
    provider: Arc<dyn IPushProvider>,
    permission: Arc<dyn IPermissionSource>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TokenProvider {
    /// Creates a provider
    ///
    /// # Arguments
    ///
    /// * `provider` - Push provider issuing the tokens
    /// * `permission` - Permission source consulted around every attempt
    /// * `max_attempts` - Upper bound on attempts (clamped to at least 1)
    /// * `retry_delay` - Fixed delay between attempts
    pub fn new(
        provider: Arc<dyn IPushProvider>,
        permission: Arc<dyn IPermissionSource>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            provider,
            permission,
            max_attempts,
            retry_delay,
        }
    }

    /// Fetches a token for `agent`
    ///
    /// The agent must already be active; tokens fetched earlier are
    /// non-functional on several platforms.
    ///
    /// # Errors
    ///
    /// See [`TokenError`].
    pub async fn fetch_token(&self, agent: &AgentHandle) -> Result<IssuedToken, TokenError> {
        let mut budget = RetryBudget::new(self.max_attempts, self.retry_delay);
        let mut last_error = String::from("no attempt made");

        loop {
            if self.permission.current().is_denied() {
                debug!(attempts = budget.attempts(), "Permission denied, abandoning token fetch");
                return Err(TokenError::PermissionDenied {
                    attempts: budget.attempts(),
                });
            }

            if !budget.try_begin_attempt() {
                warn!(attempts = budget.attempts(), error = %last_error, "Token fetch exhausted");
                return Err(TokenError::Exhausted {
                    attempts: budget.attempts(),
                    last_error,
                });
            }

            let attempt = budget.attempts();
            debug!(attempt, max = budget.max_attempts(), agent = %agent.id, "Requesting push token");

            match self.provider.get_token(agent).await {
                Ok(raw) => match self.permission.current() {
                    PermissionState::Granted => match SubscriptionToken::new(raw) {
                        Ok(token) => {
                            debug!(attempt, token = %token.redacted(), "Push token issued");
                            return Ok(IssuedToken {
                                token,
                                attempts: attempt,
                            });
                        }
                        Err(e) => {
                            warn!(attempt, error = %e, "Provider returned an unusable token");
                            last_error = e.to_string();
                        }
                    },
                    PermissionState::Denied => {
                        return Err(TokenError::PermissionDenied { attempts: attempt });
                    }
                    PermissionState::Undetermined => {
                        return Err(TokenError::PermissionDismissed { attempts: attempt });
                    }
                },
                Err(e) => {
                    if self.permission.current().is_denied() {
                        debug!(attempt, "Permission denied during token fetch");
                        return Err(TokenError::PermissionDenied { attempts: attempt });
                    }
                    warn!(attempt, error = %format!("{e:#}"), "Token fetch attempt failed");
                    last_error = format!("{e:#}");
                }
            }

            if !budget.is_exhausted() {
                tokio::time::sleep(budget.delay()).await;
            }
        }
    }
}
