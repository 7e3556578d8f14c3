//! pushsub Daemon - relay service
//!
//! This binary serves the relay endpoints:
//! - `POST /api/subscribe` and `POST /api/unsubscribe` (topic membership)
//! - `POST /api/notifications` (topic send)
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon loads and validates the YAML configuration, builds the
//! provider adapter, then runs the relay accept loop until a
//! `CancellationToken` is triggered by SIGTERM or SIGINT.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pushsub_core::config::Config;
use pushsub_relay::{FcmTopicMessaging, RelayServer, RelayState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// pushsub relay daemon
#[derive(Debug, Parser)]
#[command(name = "pushsubd", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,
}

/// Loads the configuration file and applies environment overrides
///
/// An explicit path must exist; the default path may be absent.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };
    Ok(config.with_env_overrides())
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config)?;

    logging::init_logging(&config.logging)?;
    info!("pushsub daemon starting (pushsubd)");

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!(field = %e.field, "{}", e.message);
        }
        bail!("Configuration has {} error(s)", errors.len());
    }
    if config.relay.effective_api_key().is_none() {
        warn!("No relay API key configured; every request will be refused");
    }

    let messaging =
        FcmTopicMessaging::new(&config.provider).context("Failed to set up provider adapter")?;
    let state = Arc::new(RelayState::new(Arc::new(messaging), &config.relay));
    let server = RelayServer::new(state, &config.relay.listen)
        .with_context(|| format!("Invalid listen address {}", config.relay.listen))?;

    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let result = server.run(shutdown_token).await;

    match &result {
        Ok(()) => info!("pushsub daemon shut down gracefully"),
        Err(e) => error!(error = %e, "pushsub daemon exiting with error"),
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
