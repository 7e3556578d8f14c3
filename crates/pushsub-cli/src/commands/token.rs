//! Bind and unbind commands - Manage a token's topic membership by hand
//!
//! Useful when diagnosing a device that stopped receiving notifications:
//! copy its delivery token and re-bind it, or unbind a stale one.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use pushsub_client::client::SubscriptionClient;
use pushsub_core::domain::SubscriptionToken;
use pushsub_core::ports::Ack;
use tracing::info;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Bind,
    Unbind,
}

impl Membership {
    fn verb(self) -> &'static str {
        match self {
            Membership::Bind => "bind",
            Membership::Unbind => "unbind",
        }
    }
}

#[derive(Debug, Args)]
pub struct BindCommand {
    /// Delivery token to subscribe to the topic
    pub token: String,
}

impl BindCommand {
    pub async fn execute(&self, config: Option<&Path>, format: OutputFormat) -> Result<()> {
        change_membership(Membership::Bind, &self.token, config, format).await
    }
}

#[derive(Debug, Args)]
pub struct UnbindCommand {
    /// Delivery token to remove from the topic
    pub token: String,
}

impl UnbindCommand {
    pub async fn execute(&self, config: Option<&Path>, format: OutputFormat) -> Result<()> {
        change_membership(Membership::Unbind, &self.token, config, format).await
    }
}

async fn change_membership(
    action: Membership,
    raw_token: &str,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);
    let token = SubscriptionToken::new(raw_token).context("Invalid delivery token")?;

    let config = load_config(config)?;
    let client = SubscriptionClient::new(&config.backend);
    info!(
        relay = %client.base_url(),
        token = %token.redacted(),
        action = action.verb(),
        "Changing topic membership"
    );

    let ack = match action {
        Membership::Bind => client.bind_token(&token).await,
        Membership::Unbind => client.unbind_token(&token).await,
    };
    let ack = match ack {
        Ok(ack) => ack,
        Err(e) => {
            formatter.error(&e.to_string());
            return Err(e.into());
        }
    };

    report(action, &token, &ack, format)
}

fn report(
    action: Membership,
    token: &SubscriptionToken,
    ack: &Ack,
    format: OutputFormat,
) -> Result<()> {
    let formatter = get_formatter(format);

    if format.is_json() {
        formatter.print_json(&ack_json(action, token, ack));
    } else if ack.is_confirmed() {
        formatter.success(ack.message.as_deref().unwrap_or("Done"));
        formatter.info(&format!("Token: {}", token.redacted()));
    } else {
        formatter.error(&format!(
            "Relay refused to {} token ({}): {}",
            action.verb(),
            ack.status,
            ack.failure_message()
        ));
    }

    if ack.is_confirmed() {
        Ok(())
    } else {
        anyhow::bail!("Failed to {} token: {}", action.verb(), ack.failure_message())
    }
}

fn ack_json(action: Membership, token: &SubscriptionToken, ack: &Ack) -> serde_json::Value {
    serde_json::json!({
        "action": action.verb(),
        "token": token.redacted(),
        "status": ack.status,
        "success": ack.is_confirmed(),
        "message": ack.message,
        "error": ack.error,
    })
}
