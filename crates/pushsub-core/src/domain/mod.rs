//! Domain entities and business logic
//!
//! This module contains the core domain types for push subscription:
//! - Newtypes for identifiers and the opaque subscription token
//! - Permission and device classification
//! - The orchestration status machine and its failure taxonomy
//! - The caller-owned user profile and its updates
//! - The push payload contract read by the background agent
//! - The token-fetch retry budget
//! - Domain-specific error types

pub mod device;
pub mod errors;
pub mod newtypes;
pub mod payload;
pub mod permission;
pub mod profile;
pub mod retry;
pub mod status;

// Re-export commonly used types
pub use device::{DeviceProfile, DisplayMode, EnvironmentSignals, Platform};
pub use errors::DomainError;
pub use newtypes::*;
pub use payload::{
    choose_click_action, resolve_click_target, ClickAction, DisplayedNotification, MessageData,
    NotificationContent, PushMessage,
};
pub use permission::PermissionState;
pub use profile::{ProfileUpdate, UserProfile};
pub use retry::RetryBudget;
pub use status::{FailureReason, Flow, OrchestrationStatus, StatusEvent};
