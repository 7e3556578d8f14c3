//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for identifiers and opaque values. Each newtype
//! ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

// ============================================================================
// SequenceId
// ============================================================================

/// Identifier for one orchestration sequence (subscribe or unsubscribe run)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(Uuid);

impl SequenceId {
    /// Create a new random SequenceId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a SequenceId from an existing UUID
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SequenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SequenceId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid UUID: {e}")))
    }
}

// ============================================================================
// SubscriptionToken
// ============================================================================

/// Opaque delivery token issued by the push provider
///
/// Identifies one device + app installation. The only invariant the core
/// can check is that the token is non-empty and contains no whitespace.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    /// Number of leading characters kept by [`SubscriptionToken::redacted`]
    const VISIBLE_PREFIX: usize = 8;

    /// Creates a validated token
    ///
    /// # Errors
    /// Returns `DomainError::InvalidToken` if the value is empty or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::InvalidToken("token is empty".to_string()));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidToken(
                "token contains whitespace".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the raw token value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token and returns the raw value
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns a shortened form safe for log output
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(Self::VISIBLE_PREFIX).collect();
        if prefix.len() < self.0.len() {
            format!("{prefix}...")
        } else {
            prefix
        }
    }
}

// Debug is redacted so tokens never end up verbatim in logs.
impl fmt::Debug for SubscriptionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubscriptionToken")
            .field(&self.redacted())
            .finish()
    }
}

impl Display for SubscriptionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionToken {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SubscriptionToken {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubscriptionToken> for String {
    fn from(token: SubscriptionToken) -> Self {
        token.0
    }
}

// ============================================================================
// AgentId
// ============================================================================

/// Identity of a registered background delivery agent
///
/// Assigned by the agent runtime; two handles with the same id refer to the
/// same registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an AgentId from the runtime-provided identifier
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
