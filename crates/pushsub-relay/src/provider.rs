//! FcmTopicMessaging - ITopicMessaging implementation for the provider's topic API
//!
//! Topic membership goes through the instance-ID batch endpoints, sends go
//! through the HTTP v1 `messages:send` endpoint.
//!
//! ## Design Notes
//!
//! - The adapter is handed an already-minted OAuth access token; minting it
//!   from a service account is the deployment's concern.
//! - Batch membership calls answer 200 even when an individual token is
//!   rejected; the per-token `results[].error` is checked and surfaced.
//! - The webpush `link` option only accepts absolute HTTPS URLs, so relative
//!   click URLs travel in `data.url` alone and the agent resolves them.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use pushsub_core::config::ProviderConfig;
use pushsub_core::domain::{PushMessage, SubscriptionToken};
use pushsub_core::ports::ITopicMessaging;

/// Errors that can occur when calling the provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required credential is not configured
    #[error("Missing provider credential: {0}")]
    MissingCredential(&'static str),

    /// The provider answered with a non-success status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The provider accepted the call but rejected the token
    #[error("{0}")]
    TokenRejected(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response could not be interpreted
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Provider response types
// ============================================================================

/// Response of `iid/v1:batchAdd` / `iid/v1:batchRemove`
#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    results: Vec<BatchResult>,
}

#[derive(Debug, Deserialize)]
struct BatchResult {
    error: Option<String>,
}

/// Response of `messages:send`
#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

/// Error envelope used by both APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Value,
}

// ============================================================================
// FcmTopicMessaging
// ============================================================================

/// Topic messaging adapter over `reqwest`
pub struct FcmTopicMessaging {
    client: Client,
    project_id: String,
    access_token: String,
    iid_base_url: String,
    fcm_base_url: String,
}

impl FcmTopicMessaging {
    /// Creates the adapter from the `provider` configuration section
    ///
    /// # Errors
    /// Returns `ProviderError::MissingCredential` if the project id or the
    /// access token is not configured.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let project_id = config
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(ProviderError::MissingCredential("provider.project_id"))?;
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ProviderError::MissingCredential("provider.access_token"))?;

        Ok(Self::with_base_urls(
            project_id,
            access_token,
            &config.iid_base_url,
            &config.fcm_base_url,
        ))
    }

    /// Creates the adapter with explicit endpoints (useful for testing)
    pub fn with_base_urls(
        project_id: impl Into<String>,
        access_token: impl Into<String>,
        iid_base_url: &str,
        fcm_base_url: &str,
    ) -> Self {
        Self {
            client: Client::new(),
            project_id: project_id.into(),
            access_token: access_token.into(),
            iid_base_url: iid_base_url.trim_end_matches('/').to_string(),
            fcm_base_url: fcm_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.access_token)
    }

    /// Adds or removes one token via a batch membership endpoint
    async fn change_membership(
        &self,
        action: &str,
        token: &SubscriptionToken,
        topic: &str,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/iid/v1:{action}", self.iid_base_url);
        debug!(action, topic, token = %token.redacted(), "Changing topic membership");

        let response = self
            .request(Method::POST, &url)
            .header("access_token_auth", "true")
            .json(&json!({
                "to": format!("/topics/{topic}"),
                "registration_tokens": [token.as_str()],
            }))
            .send()
            .await?;
        let response = check_status(response).await?;

        let batch: BatchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match batch.results.into_iter().find_map(|r| r.error) {
            Some(error) => Err(ProviderError::TokenRejected(error)),
            None => Ok(()),
        }
    }

    /// Builds the HTTP v1 message body for a topic send
    fn send_body(topic: &str, message: &PushMessage) -> Value {
        let mut webpush = json!({});
        if let Some(icon) = &message.notification.icon {
            webpush["notification"] = json!({ "icon": icon });
        }

        let mut body = json!({
            "message": {
                "topic": topic,
                "notification": {
                    "title": message.notification.title,
                    "body": message.notification.body,
                },
            }
        });

        if let Some(url) = &message.data.url {
            body["message"]["data"] = json!({ "url": url });
            if url.starts_with("https://") {
                webpush["fcm_options"] = json!({ "link": url });
            }
        }
        if webpush.as_object().is_some_and(|o| !o.is_empty()) {
            body["message"]["webpush"] = webpush;
        }
        body
    }
}

/// Passes 2xx responses through, turning anything else into `ProviderError::Http`
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .ok()
        .and_then(|envelope| match envelope.error {
            Value::String(s) => Some(s),
            Value::Object(obj) => obj
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| format!("Provider responded with status {}", status.as_u16()));

    Err(ProviderError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ITopicMessaging for FcmTopicMessaging {
    async fn subscribe_to_topic(&self, token: &SubscriptionToken, topic: &str) -> anyhow::Result<()> {
        Ok(self.change_membership("batchAdd", token, topic).await?)
    }

    async fn unsubscribe_from_topic(
        &self,
        token: &SubscriptionToken,
        topic: &str,
    ) -> anyhow::Result<()> {
        Ok(self.change_membership("batchRemove", token, topic).await?)
    }

    async fn send_to_topic(&self, topic: &str, message: &PushMessage) -> anyhow::Result<String> {
        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.fcm_base_url, self.project_id
        );
        debug!(topic, title = %message.notification.title, "Sending topic message");

        let response = self
            .request(Method::POST, &url)
            .json(&Self::send_body(topic, message))
            .send()
            .await
            .map_err(ProviderError::from)?;
        let response = check_status(response).await?;

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(sent.name)
    }
}
