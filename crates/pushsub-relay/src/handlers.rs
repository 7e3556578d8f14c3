//! Relay request handlers
//!
//! Routes `POST /api/subscribe`, `POST /api/unsubscribe` and
//! `POST /api/notifications`, checks the shared secret, validates the JSON
//! body and forwards to the [`ITopicMessaging`] port.
//!
//! ## Design Notes
//!
//! - Every response body is an [`ApiResponse`]; errors carry `success: false`
//!   and an `error` message the client shows verbatim.
//! - A relay without a configured key refuses every request with 500 rather
//!   than running open.
//! - Handlers are generic over the request body so tests can drive them
//!   with in-memory bodies.

use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue, ALLOW, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, info, warn};

use pushsub_core::api::{ApiResponse, NotificationRequest, TokenRequest, API_KEY_HEADER};
use pushsub_core::config::RelayConfig;
use pushsub_core::ports::ITopicMessaging;

pub const SUBSCRIBE_PATH: &str = "/api/subscribe";
pub const UNSUBSCRIBE_PATH: &str = "/api/unsubscribe";
pub const SEND_PATH: &str = "/api/notifications";

const SERVER_CONFIGURATION_ERROR: &str = "Server configuration error";
const UNAUTHORIZED: &str = "Unauthorized - Invalid or missing API key";
const MISSING_TOKEN: &str = "Missing token";
const MISSING_CONTENT: &str = "Missing notificationTitle or notificationBody";
const INVALID_JSON: &str = "Invalid JSON body";

/// Shared state of the relay handlers
pub struct RelayState {
    messaging: Arc<dyn ITopicMessaging>,
    api_key: Option<String>,
    topic: String,
    default_icon: String,
}

impl RelayState {
    /// Creates handler state from the `relay` configuration section
    pub fn new(messaging: Arc<dyn ITopicMessaging>, config: &RelayConfig) -> Self {
        Self {
            messaging,
            api_key: config.effective_api_key().map(str::to_string),
            topic: config.topic.clone(),
            default_icon: config.default_icon.clone(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Checks the shared secret from `x-api-key` or `Authorization: Bearer`
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response<Full<Bytes>>> {
        let Some(expected) = self.api_key.as_deref() else {
            error!("Relay API key is not configured");
            return Err(json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ApiResponse::error(SERVER_CONFIGURATION_ERROR),
            ));
        };

        let presented = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .or_else(|| {
                headers
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.strip_prefix("Bearer ").unwrap_or(v))
            });

        match presented {
            Some(key) if key == expected => Ok(()),
            _ => {
                warn!("Rejected request with missing or invalid API key");
                Err(json_response(
                    StatusCode::UNAUTHORIZED,
                    &ApiResponse::error(UNAUTHORIZED),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Subscribe,
    Unsubscribe,
    Send,
}

/// Handles a single HTTP request
pub async fn handle_request<B>(req: Request<B>, state: &RelayState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let route = match req.uri().path() {
        SUBSCRIBE_PATH => Route::Subscribe,
        UNSUBSCRIBE_PATH => Route::Unsubscribe,
        SEND_PATH => Route::Send,
        other => {
            debug!(path = other, "No route");
            return json_response(StatusCode::NOT_FOUND, &ApiResponse::error("Not Found"));
        }
    };

    if req.method() != Method::POST {
        let mut response = json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ApiResponse::error("Method Not Allowed"),
        );
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static("POST"));
        return response;
    }

    if let Err(response) = state.authorize(req.headers()) {
        return response;
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            return json_response(StatusCode::BAD_REQUEST, &ApiResponse::error(INVALID_JSON));
        }
    };

    match route {
        Route::Subscribe => handle_membership(&body, state, true).await,
        Route::Unsubscribe => handle_membership(&body, state, false).await,
        Route::Send => handle_send(&body, state).await,
    }
}

async fn handle_membership(
    body: &[u8],
    state: &RelayState,
    subscribe: bool,
) -> Response<Full<Bytes>> {
    let request: TokenRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return json_response(StatusCode::BAD_REQUEST, &ApiResponse::error(INVALID_JSON)),
    };
    let Some(token) = request.token() else {
        return json_response(StatusCode::BAD_REQUEST, &ApiResponse::error(MISSING_TOKEN));
    };

    let result = if subscribe {
        state.messaging.subscribe_to_topic(&token, &state.topic).await
    } else {
        state
            .messaging
            .unsubscribe_from_topic(&token, &state.topic)
            .await
    };

    match result {
        Ok(()) => {
            let verb = if subscribe { "Subscribed to" } else { "Unsubscribed from" };
            info!(token = %token.redacted(), topic = %state.topic, "{verb} topic");
            json_response(
                StatusCode::OK,
                &ApiResponse::ok(format!("{verb} topic: {}", state.topic)),
            )
        }
        Err(e) => {
            error!(
                error = %format!("{e:#}"),
                token = %token.redacted(),
                subscribe,
                "Topic membership change failed"
            );
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ApiResponse::error(e.to_string()),
            )
        }
    }
}

async fn handle_send(body: &[u8], state: &RelayState) -> Response<Full<Bytes>> {
    let request: NotificationRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return json_response(StatusCode::BAD_REQUEST, &ApiResponse::error(INVALID_JSON)),
    };
    let Some(message) = request.to_message(&state.default_icon) else {
        return json_response(StatusCode::BAD_REQUEST, &ApiResponse::error(MISSING_CONTENT));
    };

    match state.messaging.send_to_topic(&state.topic, &message).await {
        Ok(message_id) => {
            info!(topic = %state.topic, %message_id, "Notification sent");
            json_response(
                StatusCode::OK,
                &ApiResponse::ok(format!("Notification sent to topic: {}", state.topic))
                    .with_message_id(message_id),
            )
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), topic = %state.topic, "Notification send failed");
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ApiResponse::error(e.to_string()),
            )
        }
    }
}

/// Builds a JSON response with the given status
pub fn json_response(status: StatusCode, body: &ApiResponse) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{\"success\":false}".to_vec());
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
