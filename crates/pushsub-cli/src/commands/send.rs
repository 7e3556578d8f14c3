//! Send command - Broadcast a notification to every subscriber
//!
//! Posts `{notificationTitle, notificationBody, url?}` to the relay's send
//! endpoint and prints the provider message id.

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use pushsub_client::client::SubscriptionClient;
use pushsub_core::api::NotificationRequest;
use tracing::info;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SendCommand {
    /// Notification title
    #[arg(long)]
    pub title: String,

    /// Notification body
    #[arg(long)]
    pub body: String,

    /// URL opened when the notification is clicked (relative or absolute)
    #[arg(long)]
    pub url: Option<String>,
}

impl SendCommand {
    pub fn request(&self) -> NotificationRequest {
        let request = NotificationRequest::new(&self.title, &self.body);
        match &self.url {
            Some(url) => request.with_url(url),
            None => request,
        }
    }

    pub async fn execute(&self, config: Option<&Path>, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            formatter.error("Title and body must not be empty");
            bail!("Missing notification title or body");
        }

        let config = load_config(config)?;
        let client = SubscriptionClient::new(&config.backend);
        info!(relay = %client.base_url(), title = %self.title, "Sending notification");

        match client.send_notification(&self.request()).await {
            Ok(receipt) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "message": receipt.message,
                        "messageId": receipt.message_id,
                    }));
                } else {
                    formatter.success(
                        receipt
                            .message
                            .as_deref()
                            .unwrap_or("Notification sent"),
                    );
                    if let Some(id) = &receipt.message_id {
                        formatter.info(&format!("Message id: {}", id));
                    }
                }
                Ok(())
            }
            Err(e) => {
                formatter.error(&e.to_string());
                Err(e.into())
            }
        }
    }
}
