//! pushsub CLI - Operator command-line interface
//!
//! Provides commands for:
//! - Broadcasting a notification to every subscriber
//! - Binding and unbinding a delivery token by hand
//! - Classifying a device from its user agent
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand,
    detect::DetectCommand,
    send::SendCommand,
    token::{BindCommand, UnbindCommand},
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "pushsub", version, about = "Push notification subscription tooling")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a notification to every subscriber
    Send(SendCommand),
    /// Subscribe a delivery token to the topic
    Bind(BindCommand),
    /// Remove a delivery token from the topic
    Unbind(UnbindCommand),
    /// Classify a device from its environment signals
    Detect(DetectCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Send(cmd) => cmd.execute(config, format).await,
        Commands::Bind(cmd) => cmd.execute(config, format).await,
        Commands::Unbind(cmd) => cmd.execute(config, format).await,
        Commands::Detect(cmd) => cmd.execute(format).await,
        Commands::Config(cmd) => cmd.execute(config, format).await,
    }
}
