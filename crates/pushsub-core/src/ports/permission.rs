//! Permission port (driven/secondary port)
//!
//! Access to the platform's notification-permission API.
//!
//! ## Design Notes
//!
//! - `current` is synchronous because every platform exposes the decision
//!   as a plain property read.
//! - `request` suspends until the user answers the native prompt, which can
//!   take arbitrarily long. A prompt closed without a decision yields
//!   `PermissionState::Undetermined`.
//! - `subscribe_changes` returns `None` when the platform has no change
//!   event; callers then fall back to polling `current`.

use tokio::sync::watch;

use crate::domain::PermissionState;

/// Port trait for the platform's notification-permission API
#[async_trait::async_trait]
pub trait IPermissionSource: Send + Sync {
    /// Returns false if the environment has no notification API at all
    fn is_supported(&self) -> bool;

    /// Reads the current decision without prompting
    fn current(&self) -> PermissionState;

    /// Shows the native prompt (or returns the existing decision)
    async fn request(&self) -> anyhow::Result<PermissionState>;

    /// Subscribes to permission changes, if the platform emits them
    fn subscribe_changes(&self) -> Option<watch::Receiver<PermissionState>>;
}
