//! Config command - View and validate pushsub configuration
//!
//! Provides the `pushsub config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON) with secrets masked
//! 2. Validates the configuration file and reports errors
//! 3. Prints the configuration file path

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use pushsub_core::config::Config;
use tracing::info;

use crate::commands::config_path;
use crate::output::{get_formatter, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(explicit, format),
            ConfigCommand::Validate => execute_validate(explicit, format),
            ConfigCommand::Path => execute_path(explicit, format),
        }
    }
}

/// Replaces every secret with a fixed mask
fn mask_secrets(config: &mut Config) {
    for secret in [
        &mut config.backend.api_key,
        &mut config.relay.api_key,
        &mut config.provider.access_token,
    ] {
        if secret.is_some() {
            *secret = Some(MASK.to_string());
        }
    }
}

fn execute_show(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = config_path(explicit);
    let mut config = Config::load_or_default(&path).with_env_overrides();
    mask_secrets(&mut config);

    info!(config_path = %path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_validate(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let path = config_path(explicit);

    if !path.exists() {
        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "valid": true,
                "config_path": path.display().to_string(),
                "errors": [],
                "defaults": true,
            }));
        } else {
            formatter.info(&format!("Configuration file not found at {}", path.display()));
            formatter.info("Using default configuration.");
        }
        return Ok(());
    }

    let config = match Config::load(&path) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path.display().to_string(),
                    "errors": [format!("Failed to parse configuration: {}", e)],
                }));
            } else {
                formatter.error(&format!("Failed to parse configuration: {}", e));
                formatter.info(&format!("File: {}", path.display()));
            }
            anyhow::bail!("Configuration could not be parsed");
        }
    };

    info!(config_path = %path.display(), "Validating configuration");
    let errors = config.validate();

    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", path.display()));
        formatter.info("");
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}

fn execute_path(explicit: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = config_path(explicit);
    if format.is_json() {
        get_formatter(format).print_json(&serde_json::json!({
            "config_path": path.display().to_string(),
            "exists": path.exists(),
        }));
    } else {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushsub_core::config::ConfigBuilder;

    #[test]
    fn test_mask_secrets() {
        let mut config = ConfigBuilder::new()
            .backend_api_key("shared-secret")
            .provider_access_token("ya29.token")
            .build();
        mask_secrets(&mut config);

        assert_eq!(config.backend.api_key.as_deref(), Some(MASK));
        assert_eq!(config.provider.access_token.as_deref(), Some(MASK));
        assert!(config.relay.api_key.is_none());
    }

    #[test]
    fn test_validate_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(execute_validate(Some(&path), OutputFormat::Json).is_ok());
    }

    #[test]
    fn test_validate_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "orchestrator:\n  token_max_attempts: 0\n").unwrap();
        assert!(execute_validate(Some(&path), OutputFormat::Json).is_err());
    }

    #[test]
    fn test_validate_unparsable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "orchestrator: [unclosed").unwrap();
        assert!(execute_validate(Some(&path), OutputFormat::Json).is_err());
    }

    #[test]
    fn test_validate_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "relay:\n  topic: news\n").unwrap();
        assert!(execute_validate(Some(&path), OutputFormat::Json).is_ok());
    }
}
