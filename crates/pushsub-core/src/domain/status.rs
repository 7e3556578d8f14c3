//! Orchestration status machine
//!
//! [`OrchestrationStatus`] is the tagged-union state of one subscribe or
//! unsubscribe sequence and [`OrchestrationStatus::apply`] is its pure
//! transition function. The asynchronous effects (prompting, agent setup,
//! network calls) live in the orchestrator use case, which only ever moves
//! the status by feeding [`StatusEvent`]s through `apply`.
//!
//! ## Subscribe flow
//!
//! ```text
//! Idle ──requires install──▶ BlockedNeedsInstall
//!  │
//!  ▼
//! RequestingPermission ──denied / dismissed / unsupported──▶ Failed
//!  │
//!  ▼
//! AwaitingAgent ──agent failed──▶ Failed(AgentUnavailable)
//!  │
//!  ▼
//! FetchingToken ──denied / exhausted──▶ Failed
//!  │
//!  ▼
//! Registering ──rejected──▶ Failed(RegistrationFailed)
//!  │
//!  ▼
//! Success
//! ```
//!
//! ## Unsubscribe flow
//!
//! `Idle → Unregistering → Unsubscribed | Failed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::errors::DomainError;
use super::permission::PermissionState;

/// Message shown when iOS requires a home-screen install first
pub const INSTALL_REQUIRED_MESSAGE: &str = "On iPhone you must install the app first, by clicking on Share button in browser and selecting \"Add to Home Screen\"";

/// Message shown after a successful subscription
pub const SUBSCRIBED_MESSAGE: &str = "Notifications enabled successfully!";

/// Message shown after a successful unsubscription
pub const UNSUBSCRIBED_MESSAGE: &str = "Notifications disabled";

// ============================================================================
// FailureReason
// ============================================================================

/// Why a sequence ended in `Failed`
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// The environment has no notification API at all
    #[error("notifications are not supported")]
    NotificationsUnsupported,

    /// The user blocked notifications
    #[error("permission denied")]
    PermissionDenied,

    /// The prompt closed without a decision
    #[error("permission dismissed")]
    PermissionDismissed,

    /// The permission prompt itself failed; carries the platform error
    #[error("permission prompt failed: {0}")]
    PermissionPromptFailed(String),

    /// No background agent could be installed or activated
    #[error("background agent unavailable: {0}")]
    AgentUnavailable(String),

    /// Every token-fetch attempt failed transiently
    #[error("token fetch exhausted after {attempts} attempts")]
    TokenFetchExhausted { attempts: u32 },

    /// The backend refused the bind; carries the server's message verbatim
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// The backend refused the unbind; carries the server's message verbatim
    #[error("unregistration failed: {0}")]
    UnregistrationFailed(String),

    /// The optional sequence watchdog fired
    #[error("sequence timed out")]
    TimedOut,

    /// The orchestrator hit an invalid transition
    #[error("internal error: {0}")]
    Internal(String),
}

impl FailureReason {
    /// Returns true for reasons the token provider may report
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            FailureReason::PermissionDenied
                | FailureReason::PermissionDismissed
                | FailureReason::TokenFetchExhausted { .. }
        )
    }

    /// Returns true if this failure reflects a user decision rather than an
    /// environment or network problem
    pub fn is_user_decision(&self) -> bool {
        matches!(
            self,
            FailureReason::PermissionDenied | FailureReason::PermissionDismissed
        )
    }

    /// Message suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            FailureReason::NotificationsUnsupported => {
                "This browser doesn't support notifications".to_string()
            }
            FailureReason::PermissionDenied => {
                "Notifications were blocked. Please enable them in your browser settings."
                    .to_string()
            }
            FailureReason::PermissionDismissed => {
                "Notification permission was dismissed.".to_string()
            }
            FailureReason::PermissionPromptFailed(_) => {
                "Could not ask for notification permission".to_string()
            }
            FailureReason::AgentUnavailable(_) => "Service Workers unavailable".to_string(),
            FailureReason::TokenFetchExhausted { attempts } => {
                format!("Could not obtain a push token after {attempts} attempts")
            }
            FailureReason::RegistrationFailed(msg) | FailureReason::UnregistrationFailed(msg) => {
                msg.clone()
            }
            FailureReason::TimedOut => "Setting up notifications timed out".to_string(),
            FailureReason::Internal(_) => "Failed to enable notifications".to_string(),
        }
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Which sequence a status belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Subscribe,
    Unsubscribe,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Subscribe => write!(f, "subscribe"),
            Flow::Unsubscribe => write!(f, "unsubscribe"),
        }
    }
}

// ============================================================================
// StatusEvent
// ============================================================================

/// Input to the transition function, produced by the effect executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A subscribe sequence starts; `requires_install` comes from the device gate
    SubscribeRequested { requires_install: bool },
    /// The environment has no notification API
    NotificationsUnsupported,
    /// The permission decision is known (prompt answered or already decided)
    PermissionResolved(PermissionState),
    /// The prompt is left to the provider's token fetch
    PermissionDeferred,
    /// The permission prompt raised an error instead of answering
    PermissionPromptFailed(String),
    /// The background agent is active
    AgentReady,
    /// The background agent could not be set up
    AgentFailed(String),
    /// The provider issued a token
    TokenIssued,
    /// The token provider gave up
    TokenFailed(FailureReason),
    /// The backend confirmed the bind
    BindConfirmed,
    /// The backend rejected the bind
    BindRejected(String),
    /// An unsubscribe sequence starts
    UnsubscribeRequested,
    /// The backend confirmed the unbind
    UnbindConfirmed,
    /// The backend rejected the unbind
    UnbindRejected(String),
    /// The sequence watchdog fired
    TimedOut,
}

impl StatusEvent {
    /// Short name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            StatusEvent::SubscribeRequested { .. } => "subscribe_requested",
            StatusEvent::NotificationsUnsupported => "notifications_unsupported",
            StatusEvent::PermissionResolved(_) => "permission_resolved",
            StatusEvent::PermissionDeferred => "permission_deferred",
            StatusEvent::PermissionPromptFailed(_) => "permission_prompt_failed",
            StatusEvent::AgentReady => "agent_ready",
            StatusEvent::AgentFailed(_) => "agent_failed",
            StatusEvent::TokenIssued => "token_issued",
            StatusEvent::TokenFailed(_) => "token_failed",
            StatusEvent::BindConfirmed => "bind_confirmed",
            StatusEvent::BindRejected(_) => "bind_rejected",
            StatusEvent::UnsubscribeRequested => "unsubscribe_requested",
            StatusEvent::UnbindConfirmed => "unbind_confirmed",
            StatusEvent::UnbindRejected(_) => "unbind_rejected",
            StatusEvent::TimedOut => "timed_out",
        }
    }
}

// ============================================================================
// OrchestrationStatus
// ============================================================================

/// Status of the current (or last) orchestration sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum OrchestrationStatus {
    #[default]
    Idle,
    RequestingPermission,
    AwaitingAgent,
    FetchingToken,
    Registering,
    Success,
    Unregistering,
    Unsubscribed,
    Failed(FailureReason),
    BlockedNeedsInstall,
}

impl OrchestrationStatus {
    /// Applies an event and returns the next status
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTransition` if the current status does
    /// not accept the event. Terminal statuses accept nothing; a new
    /// sequence starts from a fresh `Idle`.
    pub fn apply(&self, event: StatusEvent) -> Result<OrchestrationStatus, DomainError> {
        use OrchestrationStatus as S;
        use StatusEvent as E;

        let next = match (self, &event) {
            // --- subscribe ---
            (S::Idle, E::SubscribeRequested { requires_install }) => {
                if *requires_install {
                    S::BlockedNeedsInstall
                } else {
                    S::RequestingPermission
                }
            }
            (S::RequestingPermission, E::NotificationsUnsupported) => {
                S::Failed(FailureReason::NotificationsUnsupported)
            }
            (S::RequestingPermission, E::PermissionResolved(state)) => match state {
                PermissionState::Granted => S::AwaitingAgent,
                PermissionState::Denied => S::Failed(FailureReason::PermissionDenied),
                PermissionState::Undetermined => S::Failed(FailureReason::PermissionDismissed),
            },
            (S::RequestingPermission, E::PermissionDeferred) => S::AwaitingAgent,
            (S::RequestingPermission, E::PermissionPromptFailed(detail)) => {
                S::Failed(FailureReason::PermissionPromptFailed(detail.clone()))
            }
            (S::AwaitingAgent, E::AgentReady) => S::FetchingToken,
            (S::AwaitingAgent, E::AgentFailed(detail)) => {
                S::Failed(FailureReason::AgentUnavailable(detail.clone()))
            }
            (S::FetchingToken, E::TokenIssued) => S::Registering,
            (S::FetchingToken, E::TokenFailed(reason)) if reason.is_token_failure() => {
                S::Failed(reason.clone())
            }
            (S::Registering, E::BindConfirmed) => S::Success,
            (S::Registering, E::BindRejected(msg)) => {
                S::Failed(FailureReason::RegistrationFailed(msg.clone()))
            }

            // --- unsubscribe ---
            (S::Idle, E::UnsubscribeRequested) => S::Unregistering,
            (S::Unregistering, E::AgentFailed(detail)) => {
                S::Failed(FailureReason::AgentUnavailable(detail.clone()))
            }
            (S::Unregistering, E::TokenFailed(reason)) if reason.is_token_failure() => {
                S::Failed(reason.clone())
            }
            (S::Unregistering, E::UnbindConfirmed) => S::Unsubscribed,
            (S::Unregistering, E::UnbindRejected(msg)) => {
                S::Failed(FailureReason::UnregistrationFailed(msg.clone()))
            }

            // --- watchdog ---
            (status, E::TimedOut) if status.is_in_flight() => S::Failed(FailureReason::TimedOut),

            (status, event) => {
                return Err(DomainError::InvalidTransition {
                    from: status.name().to_string(),
                    event: event.name().to_string(),
                })
            }
        };

        Ok(next)
    }

    /// Returns true if no further event is accepted
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationStatus::Success
                | OrchestrationStatus::Unsubscribed
                | OrchestrationStatus::Failed(_)
                | OrchestrationStatus::BlockedNeedsInstall
        )
    }

    /// Returns true while a sequence is between `Idle` and a terminal status
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal() && *self != OrchestrationStatus::Idle
    }

    /// Returns true for a successful terminal status of either flow
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            OrchestrationStatus::Success | OrchestrationStatus::Unsubscribed
        )
    }

    /// Returns the failure reason, if any
    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            OrchestrationStatus::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Progress for a progress ring, 0 to 100
    ///
    /// Token fetch and the backend call share the 80 step; the ring only
    /// completes on a terminal success.
    pub fn progress_percent(&self) -> u8 {
        match self {
            OrchestrationStatus::Idle => 0,
            OrchestrationStatus::RequestingPermission => 10,
            OrchestrationStatus::AwaitingAgent => 20,
            OrchestrationStatus::FetchingToken
            | OrchestrationStatus::Registering
            | OrchestrationStatus::Unregistering => 80,
            OrchestrationStatus::Success | OrchestrationStatus::Unsubscribed => 100,
            OrchestrationStatus::Failed(_) | OrchestrationStatus::BlockedNeedsInstall => 0,
        }
    }

    /// Message suitable for a toast or walkthrough, for terminal statuses
    pub fn user_message(&self) -> Option<String> {
        match self {
            OrchestrationStatus::Success => Some(SUBSCRIBED_MESSAGE.to_string()),
            OrchestrationStatus::Unsubscribed => Some(UNSUBSCRIBED_MESSAGE.to_string()),
            OrchestrationStatus::BlockedNeedsInstall => Some(INSTALL_REQUIRED_MESSAGE.to_string()),
            OrchestrationStatus::Failed(reason) => Some(reason.user_message()),
            _ => None,
        }
    }

    /// Short snake_case name
    pub fn name(&self) -> &'static str {
        match self {
            OrchestrationStatus::Idle => "idle",
            OrchestrationStatus::RequestingPermission => "requesting_permission",
            OrchestrationStatus::AwaitingAgent => "awaiting_agent",
            OrchestrationStatus::FetchingToken => "fetching_token",
            OrchestrationStatus::Registering => "registering",
            OrchestrationStatus::Success => "success",
            OrchestrationStatus::Unregistering => "unregistering",
            OrchestrationStatus::Unsubscribed => "unsubscribed",
            OrchestrationStatus::Failed(_) => "failed",
            OrchestrationStatus::BlockedNeedsInstall => "blocked_needs_install",
        }
    }
}

impl std::fmt::Display for OrchestrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationStatus::Failed(reason) => write!(f, "failed: {}", reason),
            other => write!(f, "{}", other.name()),
        }
    }
}
