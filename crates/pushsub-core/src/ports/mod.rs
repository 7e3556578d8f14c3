//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in the host environment or
//! in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IPermissionSource`] - Notification permission state and prompt
//! - [`IAgentRuntime`] - Background delivery agent registration
//! - [`IPushProvider`] - Delivery token issuance
//! - [`ISubscriptionBackend`] - Bind/unbind a token to the shared topic
//! - [`ITopicMessaging`] - Server-side topic membership and fan-out

pub mod agent_runtime;
pub mod permission;
pub mod push_provider;
pub mod subscription_backend;
pub mod topic_messaging;

pub use agent_runtime::{AgentHandle, AgentState, IAgentRuntime};
pub use permission::IPermissionSource;
pub use push_provider::IPushProvider;
pub use subscription_backend::{Ack, ISubscriptionBackend};
pub use topic_messaging::ITopicMessaging;
