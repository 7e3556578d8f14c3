//! Shared test helpers for relay integration tests
//!
//! Provides wiremock-based mocks of the provider endpoints and a running
//! relay server bound to an ephemeral port.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pushsub_core::config::RelayConfig;
use pushsub_relay::{FcmTopicMessaging, RelayServer, RelayState};

pub const PROJECT_ID: &str = "demo-project";
pub const ACCESS_TOKEN: &str = "ya29.test-token";
pub const RELAY_KEY: &str = "relay-secret";

/// Starts a mock provider and returns it with an adapter pointed at it
pub async fn setup_provider_mock() -> (MockServer, FcmTopicMessaging) {
    let server = MockServer::start().await;
    let messaging =
        FcmTopicMessaging::with_base_urls(PROJECT_ID, ACCESS_TOKEN, &server.uri(), &server.uri());
    (server, messaging)
}

/// Mounts a batch membership endpoint answering with `results`
pub async fn mount_batch(server: &MockServer, action: &str, results: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(format!("/iid/v1:{action}")))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(header("access_token_auth", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": results })),
        )
        .mount(server)
        .await;
}

/// Mounts the send endpoint answering with a message name
pub async fn mount_send(server: &MockServer, name: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/projects/{PROJECT_ID}/messages:send")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": name })))
        .mount(server)
        .await;
}

/// A relay server running on an ephemeral port
pub struct RunningRelay {
    pub base_url: String,
    pub shutdown: CancellationToken,
    pub handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// Starts a relay in front of `messaging` with the test key configured
pub async fn start_relay(messaging: FcmTopicMessaging) -> RunningRelay {
    let config = RelayConfig {
        api_key: Some(RELAY_KEY.to_string()),
        ..RelayConfig::default()
    };
    let state = Arc::new(RelayState::new(Arc::new(messaging), &config));
    let server = RelayServer::new(state, "127.0.0.1:0").expect("valid address");

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let shutdown = CancellationToken::new();

    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.serve(listener, shutdown).await })
    };

    RunningRelay {
        base_url: format!("http://{addr}"),
        shutdown,
        handle,
    }
}
