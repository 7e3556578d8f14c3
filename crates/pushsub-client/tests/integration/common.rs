//! Shared test helpers for relay client integration tests

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pushsub_client::client::SubscriptionClient;

pub const API_KEY: &str = "test-api-key";

/// Starts a mock relay and returns a client pointed at it with the test key
pub async fn setup_relay_mock() -> (MockServer, SubscriptionClient) {
    let server = MockServer::start().await;
    let client = SubscriptionClient::with_base_url(server.uri()).with_api_key(API_KEY);
    (server, client)
}

/// Mounts `POST <endpoint>` requiring the test key, answering with `status` and `body`
pub async fn mount_post(
    server: &MockServer,
    endpoint: &str,
    status: u16,
    body: serde_json::Value,
) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
