//! pushsub Core - Domain logic for push notification subscription
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `DeviceProfile`, `PermissionState`, `SubscriptionToken`,
//!   `OrchestrationStatus`, `UserProfile`, `PushMessage`
//! - **State machine** - `OrchestrationStatus::apply`, a pure transition function
//!   over `StatusEvent`s
//! - **Port definitions** - Traits for adapters: `IPermissionSource`, `IAgentRuntime`,
//!   `IPushProvider`, `ISubscriptionBackend`, `ITopicMessaging`
//! - **Wire types** - JSON bodies of the relay endpoints (`api`)
//! - **Use cases** - `BackgroundAgentManager`, `TokenProvider`,
//!   `SubscriptionOrchestrator`, `PermissionWatcher`
//!
//! # Architecture
//!
//! The domain module is pure: no I/O, no timers. Ports define the trait
//! interfaces implemented by the host environment (browser bindings, test
//! doubles) and by the adapter crates. Use cases execute the asynchronous
//! effects and feed their results back into the state machine.

pub mod api;
pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
