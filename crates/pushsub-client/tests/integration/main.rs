//! Integration tests for pushsub-client
//!
//! Uses wiremock to simulate the relay endpoints and verifies the request
//! shape, header handling and response interpretation of SubscriptionClient.

mod common;

mod test_bind;
mod test_send;
