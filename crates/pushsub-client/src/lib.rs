//! pushsub Client - HTTP client for the relay endpoints
//!
//! Provides:
//! - Bind/unbind of a delivery token to the shared topic
//! - Sending a notification to every subscriber of the topic
//!
//! ## Modules
//!
//! - [`client`] - Typed HTTP client over `reqwest`
//! - [`backend`] - [`ISubscriptionBackend`](pushsub_core::ports::ISubscriptionBackend) adapter

pub mod backend;
pub mod client;

use thiserror::Error;

/// Errors that can occur when talking to the relay
#[derive(Debug, Error)]
pub enum ClientError {
    /// The shared secret was rejected (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The relay or its provider failed (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Maps an HTTP status plus server message to an error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ClientError::BadRequest(message),
            401 => ClientError::Unauthorized(message),
            500..=599 => ClientError::ServerError(message),
            _ => ClientError::UnexpectedStatus { status, message },
        }
    }
}
