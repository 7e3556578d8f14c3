//! Notification permission state
//!
//! Mirrors the platform's notification-permission decision. The value can
//! change outside the orchestrator's control (site settings), so callers
//! re-read it through the permission port instead of caching it.

use serde::{Deserialize, Serialize};

/// The user's notification-permission decision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// No decision yet; a prompt may still be shown
    #[default]
    Undetermined,
    /// The user allowed notifications
    Granted,
    /// The user blocked notifications
    Denied,
}

impl PermissionState {
    /// Parses the platform's permission string (`"default"`, `"granted"`, `"denied"`)
    ///
    /// Unknown values degrade to `Undetermined`.
    pub fn from_platform(value: &str) -> Self {
        match value {
            "granted" => PermissionState::Granted,
            "denied" => PermissionState::Denied,
            _ => PermissionState::Undetermined,
        }
    }

    /// Returns true if notifications are allowed
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    /// Returns true if notifications are blocked
    pub fn is_denied(&self) -> bool {
        matches!(self, PermissionState::Denied)
    }

    /// Returns true once the user has made a decision either way
    pub fn is_decided(&self) -> bool {
        !matches!(self, PermissionState::Undetermined)
    }

    /// Label for the status indicator
    pub fn indicator_label(&self) -> &'static str {
        match self {
            PermissionState::Granted => "Enabled",
            PermissionState::Denied => "Blocked",
            PermissionState::Undetermined => "Pending",
        }
    }

    /// Hint shown next to the indicator while notifications are not enabled
    pub fn indicator_hint(&self) -> Option<&'static str> {
        match self {
            PermissionState::Granted => None,
            PermissionState::Denied => Some("Enable in browser settings to receive notifications"),
            PermissionState::Undetermined => Some("Requesting permission..."),
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PermissionState::Undetermined => "undetermined",
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
        };
        write!(f, "{}", s)
    }
}
