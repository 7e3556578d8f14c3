//! CLI subcommands

pub mod config;
pub mod detect;
pub mod send;
pub mod token;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pushsub_core::config::Config;

/// Resolves the configuration file path (`--config` or the default)
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path)
}

/// Loads the configuration used by network commands
///
/// An explicit `--config` file must exist and parse; the default file may be
/// missing. Environment overrides are applied last.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };
    Ok(config.with_env_overrides())
}
