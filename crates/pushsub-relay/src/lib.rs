//! pushsub Relay - authenticated pass-through to the push provider
//!
//! Exposes the bind, unbind and send endpoints consumed by clients and
//! forwards them to the provider's topic API.
//!
//! ## Modules
//!
//! - [`handlers`] - Request routing, authentication and validation
//! - [`provider`] - Topic API adapter over `reqwest`
//! - [`server`] - hyper HTTP/1 accept loop with graceful shutdown

pub mod handlers;
pub mod provider;
pub mod server;

pub use handlers::RelayState;
pub use provider::{FcmTopicMessaging, ProviderError};
pub use server::RelayServer;
