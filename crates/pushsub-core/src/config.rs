//! Configuration module for pushsub.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, environment overrides, validation, defaults, and a builder
//! pattern for programmatic use.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable holding the shared secret for the backend endpoints.
pub const ENV_API_KEY: &str = "PUSHSUB_API_KEY";

/// Environment variable holding the push provider access token.
pub const ENV_PROVIDER_TOKEN: &str = "PUSHSUB_PROVIDER_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for pushsub.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub orchestrator: OrchestratorConfig,
    pub backend: BackendConfig,
    pub relay: RelayConfig,
    pub provider: ProviderConfig,
    pub logging: LoggingConfig,
}

/// When the native permission prompt fires relative to agent setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStrategy {
    /// Prompt explicitly before installing the background agent.
    #[default]
    RequestUpFront,
    /// Let the provider's token fetch trigger the prompt.
    DeferToTokenFetch,
}

/// Client-side subscription sequence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub permission_strategy: PermissionStrategy,
    /// Upper bound on token-fetch attempts per sequence.
    pub token_max_attempts: u32,
    /// Fixed delay between token-fetch attempts (milliseconds).
    pub token_retry_delay_ms: u64,
    /// Extra wait after agent activation on iOS (milliseconds).
    pub ios_stabilization_delay_ms: u64,
    /// URL of the background agent script.
    pub agent_script_url: String,
    /// Scope the agent is registered for.
    pub agent_scope: String,
    /// Polling interval when the platform emits no permission-change events (milliseconds).
    pub permission_poll_interval_ms: u64,
    /// Optional watchdog for a whole sequence (seconds). `None` disables it.
    pub sequence_timeout_secs: Option<u64>,
}

/// Backend endpoints consumed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub subscribe_path: String,
    pub unsubscribe_path: String,
    pub send_path: String,
    /// Shared secret sent as `x-api-key`.
    pub api_key: Option<String>,
}

/// Relay server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind, e.g. `127.0.0.1:8787`.
    pub listen: String,
    /// Expected shared secret. Requests are refused while unset.
    pub api_key: Option<String>,
    /// The single broadcast topic.
    pub topic: String,
    /// Icon attached to sent notifications.
    pub default_icon: String,
}

/// Push provider (topic API) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub project_id: Option<String>,
    /// Already-minted OAuth access token for the provider.
    pub access_token: Option<String>,
    pub iid_base_url: String,
    pub fcm_base_url: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `compact`, `pretty`, or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/pushsub/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("pushsub")
            .join("config.yaml")
    }

    /// Applies `PUSHSUB_API_KEY` and `PUSHSUB_PROVIDER_TOKEN` from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    /// Applies overrides from an arbitrary lookup (the environment in production).
    ///
    /// The API key feeds both the client and the relay since it is a shared secret.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.backend.api_key = Some(key.clone());
            self.relay.api_key = Some(key);
        }
        if let Some(token) = lookup(ENV_PROVIDER_TOKEN).filter(|v| !v.is_empty()) {
            self.provider.access_token = Some(token);
        }
    }
}

impl RelayConfig {
    /// The shared secret, treating an empty key as unset
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

impl OrchestratorConfig {
    pub fn token_retry_delay(&self) -> Duration {
        Duration::from_millis(self.token_retry_delay_ms)
    }

    pub fn ios_stabilization_delay(&self) -> Duration {
        Duration::from_millis(self.ios_stabilization_delay_ms)
    }

    pub fn permission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.permission_poll_interval_ms)
    }

    pub fn sequence_timeout(&self) -> Option<Duration> {
        self.sequence_timeout_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            permission_strategy: PermissionStrategy::RequestUpFront,
            token_max_attempts: 3,
            token_retry_delay_ms: 1000,
            ios_stabilization_delay_ms: 1000,
            agent_script_url: "/messaging-sw.js".to_string(),
            agent_scope: "/".to_string(),
            permission_poll_interval_ms: 2000,
            sequence_timeout_secs: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            subscribe_path: "/api/subscribe".to_string(),
            unsubscribe_path: "/api/unsubscribe".to_string(),
            send_path: "/api/notifications".to_string(),
            api_key: None,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8787".to_string(),
            api_key: None,
            topic: "all-users".to_string(),
            default_icon: "/logo.svg".to_string(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token: None,
            iid_base_url: "https://iid.googleapis.com".to_string(),
            fcm_base_url: "https://fcm.googleapis.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"orchestrator.token_max_attempts"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["compact", "pretty", "json"];

/// Upper bound for `orchestrator.token_max_attempts`.
const MAX_TOKEN_ATTEMPTS: u32 = 10;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: &str, message: String| {
            errors.push(ValidationError {
                field: field.into(),
                message,
            })
        };

        // --- orchestrator ---
        let o = &self.orchestrator;
        if o.token_max_attempts == 0 || o.token_max_attempts > MAX_TOKEN_ATTEMPTS {
            push(
                "orchestrator.token_max_attempts",
                format!("must be in range 1..={MAX_TOKEN_ATTEMPTS}"),
            );
        }
        if o.agent_script_url.trim().is_empty() {
            push("orchestrator.agent_script_url", "must not be empty".into());
        }
        if !o.agent_scope.starts_with('/') {
            push("orchestrator.agent_scope", "must start with '/'".into());
        }
        if o.permission_poll_interval_ms == 0 {
            push(
                "orchestrator.permission_poll_interval_ms",
                "must be greater than 0".into(),
            );
        }
        if o.sequence_timeout_secs == Some(0) {
            push(
                "orchestrator.sequence_timeout_secs",
                "must be greater than 0 when set".into(),
            );
        }

        // --- backend ---
        if let Err(message) = check_http_url(&self.backend.base_url) {
            push("backend.base_url", message);
        }
        for (field, value) in [
            ("backend.subscribe_path", &self.backend.subscribe_path),
            ("backend.unsubscribe_path", &self.backend.unsubscribe_path),
            ("backend.send_path", &self.backend.send_path),
        ] {
            if !value.starts_with('/') {
                push(field, format!("must start with '/': {value}"));
            }
        }

        // --- relay ---
        if self.relay.listen.parse::<SocketAddr>().is_err() {
            push(
                "relay.listen",
                format!("not a socket address: {}", self.relay.listen),
            );
        }
        if !is_valid_topic(&self.relay.topic) {
            push(
                "relay.topic",
                format!(
                    "invalid topic '{}'; allowed characters: A-Z a-z 0-9 - _ . ~ %",
                    self.relay.topic
                ),
            );
        }

        // --- provider ---
        if let Err(message) = check_http_url(&self.provider.iid_base_url) {
            push("provider.iid_base_url", message);
        }
        if let Err(message) = check_http_url(&self.provider.fcm_base_url) {
            push("provider.fcm_base_url", message);
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            push(
                "logging.level",
                format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            );
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            push(
                "logging.format",
                format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            );
        }

        errors
    }
}

fn check_http_url(value: &str) -> Result<(), String> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(format!("unsupported scheme '{}'", url.scheme())),
        Err(e) => Err(format!("invalid URL '{value}': {e}")),
    }
}

/// Provider topic names: `[a-zA-Z0-9-_.~%]+`.
fn is_valid_topic(topic: &str) -> bool {
    !topic.is_empty()
        && topic
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~' | '%'))
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use pushsub_core::config::{ConfigBuilder, PermissionStrategy};
///
/// let config = ConfigBuilder::new()
///     .permission_strategy(PermissionStrategy::DeferToTokenFetch)
///     .token_max_attempts(5)
///     .backend_base_url("https://app.example.com")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- orchestrator ---

    pub fn permission_strategy(mut self, strategy: PermissionStrategy) -> Self {
        self.config.orchestrator.permission_strategy = strategy;
        self
    }

    pub fn token_max_attempts(mut self, n: u32) -> Self {
        self.config.orchestrator.token_max_attempts = n;
        self
    }

    pub fn token_retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.orchestrator.token_retry_delay_ms = ms;
        self
    }

    pub fn ios_stabilization_delay_ms(mut self, ms: u64) -> Self {
        self.config.orchestrator.ios_stabilization_delay_ms = ms;
        self
    }

    pub fn agent_script_url(mut self, url: impl Into<String>) -> Self {
        self.config.orchestrator.agent_script_url = url.into();
        self
    }

    pub fn agent_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.orchestrator.agent_scope = scope.into();
        self
    }

    pub fn permission_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.orchestrator.permission_poll_interval_ms = ms;
        self
    }

    pub fn sequence_timeout_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.sequence_timeout_secs = Some(secs);
        self
    }

    // --- backend ---

    pub fn backend_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.backend.base_url = url.into();
        self
    }

    pub fn backend_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.backend.api_key = Some(key.into());
        self
    }

    // --- relay ---

    pub fn relay_listen(mut self, addr: impl Into<String>) -> Self {
        self.config.relay.listen = addr.into();
        self
    }

    pub fn relay_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.relay.api_key = Some(key.into());
        self
    }

    pub fn relay_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.relay.topic = topic.into();
        self
    }

    // --- provider ---

    pub fn provider_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.config.provider.project_id = Some(project_id.into());
        self
    }

    pub fn provider_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.provider.access_token = Some(token.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
