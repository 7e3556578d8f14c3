//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures and invalid state machine transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An event was applied to a status that does not accept it
    #[error("Invalid state transition from {from} on {event}")]
    InvalidTransition {
        /// The current status
        from: String,
        /// The rejected event
        event: String,
    },

    /// Subscription token is empty or malformed
    #[error("Invalid subscription token: {0}")]
    InvalidToken(String),

    /// URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidToken("empty".to_string());
        assert_eq!(err.to_string(), "Invalid subscription token: empty");

        let err = DomainError::InvalidTransition {
            from: "idle".to_string(),
            event: "bind_confirmed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition from idle on bind_confirmed"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidUrl("::".to_string());
        let err2 = DomainError::InvalidUrl("::".to_string());
        let err3 = DomainError::InvalidUrl("other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
