//! Relay HTTP client
//!
//! Provides a typed HTTP client for the bind, unbind and send endpoints.
//! Handles the shared-secret header, JSON bodies and endpoint construction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pushsub_client::client::SubscriptionClient;
//! use pushsub_core::api::NotificationRequest;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SubscriptionClient::with_base_url("https://app.example.com")
//!     .with_api_key("shared-secret");
//! let receipt = client
//!     .send_notification(&NotificationRequest::new("Vote open", "Cast your vote"))
//!     .await?;
//! println!("sent: {:?}", receipt.message_id);
//! # Ok(())
//! # }
//! ```

use pushsub_core::api::{ApiResponse, NotificationRequest, TokenRequest, API_KEY_HEADER};
use pushsub_core::config::BackendConfig;
use pushsub_core::domain::SubscriptionToken;
use pushsub_core::ports::Ack;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::ClientError;

/// Result of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message: Option<String>,
    /// Provider-assigned message id
    pub message_id: Option<String>,
}

// ============================================================================
// SubscriptionClient
// ============================================================================

/// HTTP client for the relay endpoints
///
/// Wraps `reqwest::Client` with the shared-secret header and the configured
/// endpoint paths.
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    subscribe_path: String,
    unsubscribe_path: String,
    send_path: String,
}

impl SubscriptionClient {
    /// Creates a client from the `backend` configuration section
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            subscribe_path: config.subscribe_path.clone(),
            unsubscribe_path: config.unsubscribe_path.clone(),
            send_path: config.send_path.clone(),
        }
    }

    /// Creates a client with default paths and no API key (useful for testing)
    ///
    /// # Arguments
    /// * `base_url` - Origin of the relay, without trailing slash
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let config = BackendConfig {
            base_url: base_url.into(),
            ..BackendConfig::default()
        };
        Self::new(&config)
    }

    /// Sets the shared secret sent as `x-api-key`
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for `path`, adding the API key header
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Binds `token` to the shared topic
    ///
    /// Any response with a readable status is returned as an [`Ack`],
    /// including rejections; check [`Ack::is_confirmed`].
    ///
    /// # Errors
    /// Returns `ClientError::NetworkError` if the request could not be sent.
    pub async fn bind_token(&self, token: &SubscriptionToken) -> Result<Ack, ClientError> {
        debug!(token = %token.redacted(), "Binding token");
        self.post_token(&self.subscribe_path, token).await
    }

    /// Unbinds `token` from the shared topic
    ///
    /// # Errors
    /// Returns `ClientError::NetworkError` if the request could not be sent.
    pub async fn unbind_token(&self, token: &SubscriptionToken) -> Result<Ack, ClientError> {
        debug!(token = %token.redacted(), "Unbinding token");
        self.post_token(&self.unsubscribe_path, token).await
    }

    /// Sends a notification to every subscriber of the topic
    ///
    /// # Errors
    /// Returns a status-specific [`ClientError`] carrying the server message
    /// when the relay does not confirm the send.
    pub async fn send_notification(
        &self,
        request: &NotificationRequest,
    ) -> Result<SendReceipt, ClientError> {
        debug!(title = ?request.notification_title, "Sending notification");

        let response = self
            .request(Method::POST, &self.send_path)
            .json(request)
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        if (200..300).contains(&status) && body.success {
            return Ok(SendReceipt {
                message: body.message,
                message_id: body.message_id,
            });
        }

        let message = body
            .error
            .or(body.message)
            .unwrap_or_else(|| format!("Server responded with status {status}"));
        warn!(status, error = %message, "Send rejected");
        Err(ClientError::from_status(status, message))
    }

    async fn post_token(&self, path: &str, token: &SubscriptionToken) -> Result<Ack, ClientError> {
        let response = self
            .request(Method::POST, path)
            .json(&TokenRequest::new(token))
            .send()
            .await?;
        let (status, body) = read_body(response).await?;

        let ack = Ack {
            status,
            success: body.success,
            message: body.message,
            error: body.error,
        };
        if !ack.is_confirmed() {
            warn!(status, error = %ack.failure_message(), path, "Relay did not confirm");
        }
        Ok(ack)
    }
}

/// Reads the status and the JSON body; a non-JSON body yields an empty response
async fn read_body(response: Response) -> Result<(u16, ApiResponse), ClientError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    let body = if text.trim().is_empty() {
        ApiResponse::default()
    } else {
        serde_json::from_str(&text).unwrap_or_else(|e| {
            debug!(status, error = %e, "Response body is not JSON");
            ApiResponse::default()
        })
    };
    Ok((status, body))
}
