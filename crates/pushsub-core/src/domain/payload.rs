//! Push payload contract
//!
//! The background agent renders incoming messages from a fixed set of
//! payload fields: `notification.title`, `notification.body`,
//! `notification.icon` and `data.url`. The backend must shape its messages
//! accordingly; this module is the single definition of that shape and of
//! the agent's declarative reaction to it.

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::DomainError;

/// Icon used when a message carries none
pub const DEFAULT_ICON: &str = "/logo.svg";

/// Click target used when a message carries no URL
pub const DEFAULT_CLICK_URL: &str = "/";

/// Visible part of a push message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Data part of a push message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Message as delivered to the background agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub notification: NotificationContent,
    #[serde(default)]
    pub data: MessageData,
}

impl PushMessage {
    /// Creates a message with title and body
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            notification: NotificationContent {
                title: title.into(),
                body: body.into(),
                icon: None,
            },
            data: MessageData::default(),
        }
    }

    /// Sets the click-through URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.data.url = Some(url.into());
        self
    }

    /// Sets the icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.notification.icon = Some(icon.into());
        self
    }
}

/// Notification as the agent displays it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub click_url: String,
}

impl DisplayedNotification {
    /// Applies the agent's defaults to an incoming message
    pub fn from_message(message: &PushMessage, default_icon: &str) -> Self {
        Self {
            title: message.notification.title.clone(),
            body: message.notification.body.clone(),
            icon: message
                .notification
                .icon
                .clone()
                .unwrap_or_else(|| default_icon.to_string()),
            click_url: message
                .data
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_CLICK_URL.to_string()),
        }
    }
}

/// What the agent does when a notification is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Navigate an already-open window of the app, then focus it
    FocusAndNavigate { client_url: Url, target: Url },
    /// No app window is open; open a new one
    OpenWindow { target: Url },
}

/// Resolves a click URL against the app origin
///
/// Relative URLs are joined onto the origin; absolute URLs are kept as-is.
///
/// # Errors
/// Returns `DomainError::InvalidUrl` if the URL cannot be resolved.
pub fn resolve_click_target(origin: &Url, url: &str) -> Result<Url, DomainError> {
    origin
        .join(url)
        .map_err(|e| DomainError::InvalidUrl(format!("{url}: {e}")))
}

/// Chooses the click reaction given the URLs of currently open windows
///
/// The first window on the app's origin is reused; otherwise a new window
/// is opened.
///
/// # Errors
/// Returns `DomainError::InvalidUrl` if the click URL cannot be resolved.
pub fn choose_click_action(
    origin: &Url,
    open_clients: &[Url],
    click_url: &str,
) -> Result<ClickAction, DomainError> {
    let target = resolve_click_target(origin, click_url)?;

    let same_origin = open_clients
        .iter()
        .find(|client| client.origin() == origin.origin());

    Ok(match same_origin {
        Some(client) => ClickAction::FocusAndNavigate {
            client_url: client.clone(),
            target,
        },
        None => ClickAction::OpenWindow { target },
    })
}
