//! HTTP wire types shared by the relay server and its client
//!
//! Field names follow the JSON contract of the backend endpoints
//! (`token`, `notificationTitle`, `notificationBody`, `url`, `messageId`).

use serde::{Deserialize, Serialize};

use crate::domain::{PushMessage, SubscriptionToken};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Body of `POST /api/subscribe` and `POST /api/unsubscribe`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenRequest {
    pub fn new(token: &SubscriptionToken) -> Self {
        Self {
            token: Some(token.as_str().to_string()),
        }
    }

    /// The token if present and non-blank
    pub fn token(&self) -> Option<SubscriptionToken> {
        self.token
            .as_deref()
            .and_then(|t| SubscriptionToken::new(t).ok())
    }
}

/// Body of `POST /api/notifications`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(default)]
    pub notification_title: Option<String>,
    #[serde(default)]
    pub notification_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            notification_title: Some(title.into()),
            notification_body: Some(body.into()),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builds the provider message, or `None` if title or body is missing
    pub fn to_message(&self, icon: &str) -> Option<PushMessage> {
        let title = self.notification_title.as_deref().filter(|t| !t.is_empty())?;
        let body = self.notification_body.as_deref().filter(|b| !b.is_empty())?;

        let mut message = PushMessage::new(title, body).with_icon(icon);
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            message = message.with_url(url);
        }
        Some(message)
    }
}

/// Response body of every endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_request_field_names() {
        let json = r#"{"notificationTitle":"Vote","notificationBody":"Now open","url":"/voting"}"#;
        let req: NotificationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.notification_title.as_deref(), Some("Vote"));

        let message = req.to_message("/logo.svg").unwrap();
        assert_eq!(message.notification.icon.as_deref(), Some("/logo.svg"));
        assert_eq!(message.data.url.as_deref(), Some("/voting"));
    }

    #[test]
    fn test_missing_title_or_body() {
        let req: NotificationRequest = serde_json::from_str(r#"{"notificationTitle":"x"}"#).unwrap();
        assert!(req.to_message("/logo.svg").is_none());

        let empty = NotificationRequest::new("", "body");
        assert!(empty.to_message("/logo.svg").is_none());
    }

    #[test]
    fn test_blank_token_is_missing() {
        let req: TokenRequest = serde_json::from_str(r#"{"token":"  "}"#).unwrap();
        assert!(req.token().is_none());
        let req: TokenRequest = serde_json::from_str("{}").unwrap();
        assert!(req.token().is_none());
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(ApiResponse::ok("sent").with_message_id("m-1")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["messageId"], "m-1");
        assert!(json.get("error").is_none());

        let parsed: ApiResponse = serde_json::from_str(r#"{"error":"Missing token"}"#).unwrap();
        assert!(!parsed.success);
    }
}
