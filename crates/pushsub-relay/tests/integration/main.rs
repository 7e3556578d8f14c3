//! Integration tests for pushsub-relay
//!
//! Uses wiremock to simulate the provider's topic API and verifies the
//! adapter on its own and the full client → relay → provider path.

mod common;

mod test_end_to_end;
mod test_provider;
