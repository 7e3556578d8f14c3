//! Use cases (interactors) for pushsub
//!
//! This module contains the application use cases that drive the ports.
//! Use cases are thin coordinators: state rules live in the domain status
//! machine, I/O lives behind the ports.
//!
//! ## Use Cases
//!
//! - [`SubscriptionOrchestrator`] - Subscribe/unsubscribe sequences
//! - [`BackgroundAgentManager`] - Idempotent background agent setup
//! - [`TokenProvider`] - Token acquisition with bounded retry
//! - [`PermissionWatcher`] - Permission-change observation (events or polling)

pub mod ensure_agent;
pub mod fetch_token;
pub mod orchestrator;
pub mod watch_permission;

#[cfg(test)]
pub(crate) mod test_support;

pub use ensure_agent::{AgentError, BackgroundAgentManager};
pub use fetch_token::{IssuedToken, TokenError, TokenProvider};
pub use orchestrator::{
    OrchestratorSettings, SequenceOutcome, SequenceReport, SubscriptionOrchestrator,
};
pub use watch_permission::{PermissionWatch, PermissionWatcher, WatchMode};
