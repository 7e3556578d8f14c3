//! Caller-owned user profile
//!
//! The orchestrator never mutates the profile. It returns a
//! [`ProfileUpdate`] in its sequence report and the owner applies it.
//! The profile lives in memory only.

use serde::{Deserialize, Serialize};

use super::newtypes::SubscriptionToken;

/// State change requested by a finished sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "token", rename_all = "snake_case")]
pub enum ProfileUpdate {
    /// Remember the token bound to the topic
    SetToken(SubscriptionToken),
    /// Forget the token after a confirmed unbind
    ClearToken,
}

/// In-memory view of the current user relevant to push delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    push_token: Option<SubscriptionToken>,
}

impl UserProfile {
    /// Creates an unsubscribed profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a profile that already holds a token
    pub fn with_token(token: SubscriptionToken) -> Self {
        Self {
            push_token: Some(token),
        }
    }

    /// Returns the cached token, if any
    pub fn push_token(&self) -> Option<&SubscriptionToken> {
        self.push_token.as_ref()
    }

    /// Returns true while a token is cached
    pub fn is_subscribed(&self) -> bool {
        self.push_token.is_some()
    }

    /// Applies an update produced by the orchestrator
    pub fn apply(&mut self, update: ProfileUpdate) {
        match update {
            ProfileUpdate::SetToken(token) => self.push_token = Some(token),
            ProfileUpdate::ClearToken => self.push_token = None,
        }
    }
}
