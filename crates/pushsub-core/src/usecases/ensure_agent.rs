//! Background agent use case
//!
//! Ensures exactly one background delivery agent is installed and active for
//! the configured scope.
//!
//! ## Design Notes
//!
//! - The active handle is cached behind an async mutex that is held across
//!   the whole lookup/install/activation sequence. Concurrent callers queue
//!   on the lock and then hit the cache, so they converge on one agent with
//!   a single install call.
//! - The platform registration call is itself idempotent by scope, so the
//!   manager never assumes exclusive ownership of the registration; it only
//!   reuses whatever the runtime reports.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::FailureReason;
use crate::ports::{AgentHandle, IAgentRuntime};

/// Why no active agent could be produced
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The environment cannot run background agents at all
    #[error("background agents are not supported in this environment")]
    Unsupported,

    #[error("failed to look up agent registration: {0}")]
    Lookup(String),

    #[error("failed to install agent: {0}")]
    Install(String),

    #[error("agent never became active: {0}")]
    Activation(String),
}

impl From<AgentError> for FailureReason {
    fn from(err: AgentError) -> Self {
        FailureReason::AgentUnavailable(err.to_string())
    }
}

/// Idempotent installer for the background delivery agent
pub struct BackgroundAgentManager {
    runtime: Arc<dyn IAgentRuntime>,
    script_url: String,
    scope: String,
    active: Mutex<Option<AgentHandle>>,
}

impl BackgroundAgentManager {
    /// Creates a manager for `script_url` registered under `scope`
    pub fn new(
        runtime: Arc<dyn IAgentRuntime>,
        script_url: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            runtime,
            script_url: script_url.into(),
            scope: scope.into(),
            active: Mutex::new(None),
        }
    }

    /// Returns an active agent, installing it first if needed
    ///
    /// Looks for an existing registration under the scope, installs the
    /// script if there is none, then suspends until the agent is active.
    ///
    /// # Errors
    ///
    /// Returns `AgentError::Unsupported` up front when the runtime has no
    /// background agent support; the other variants wrap runtime failures.
    pub async fn ensure_agent(&self) -> Result<AgentHandle, AgentError> {
        if !self.runtime.is_supported() {
            return Err(AgentError::Unsupported);
        }

        let mut active = self.active.lock().await;
        if let Some(handle) = active.as_ref().filter(|h| h.is_active()) {
            debug!(agent = %handle.id, "Reusing active background agent");
            return Ok(handle.clone());
        }

        let existing = self
            .runtime
            .get_registration(&self.scope)
            .await
            .map_err(|e| AgentError::Lookup(format!("{e:#}")))?;

        let handle = match existing {
            Some(handle) => {
                debug!(agent = %handle.id, state = ?handle.state, "Found existing agent registration");
                handle
            }
            None => {
                info!(script = %self.script_url, scope = %self.scope, "Installing background agent");
                self.runtime
                    .register(&self.script_url, &self.scope)
                    .await
                    .map_err(|e| AgentError::Install(format!("{e:#}")))?
            }
        };

        let handle = if handle.is_active() {
            handle
        } else {
            self.runtime
                .wait_until_active(&handle)
                .await
                .map_err(|e| AgentError::Activation(format!("{e:#}")))?
        };

        if !handle.is_active() {
            return Err(AgentError::Activation(format!(
                "agent {} reported state {:?}",
                handle.id, handle.state
            )));
        }

        info!(agent = %handle.id, "Background agent active");
        *active = Some(handle.clone());
        Ok(handle)
    }

    /// Scope the agent is registered for
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::AgentState;
    use crate::usecases::test_support::MockAgentRuntime;

    #[tokio::test]
    async fn test_installs_when_absent_and_reuses_afterwards() {
        let runtime = Arc::new(MockAgentRuntime::new());
        let manager = BackgroundAgentManager::new(runtime.clone(), "/messaging-sw.js", "/");

        let first = manager.ensure_agent().await.unwrap();
        let second = manager.ensure_agent().await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.is_active());
        assert_eq!(runtime.register_calls(), 1);
        assert_eq!(runtime.get_registration_calls(), 1);
    }

    #[tokio::test]
    async fn test_reuses_existing_registration() {
        let runtime = Arc::new(MockAgentRuntime::with_existing(AgentState::Waiting));
        let manager = BackgroundAgentManager::new(runtime.clone(), "/messaging-sw.js", "/");

        let handle = manager.ensure_agent().await.unwrap();
        assert!(handle.is_active());
        assert_eq!(handle.id.as_str(), "existing-agent");
        assert_eq!(runtime.register_calls(), 0);
        assert_eq!(runtime.wait_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_calls_converge() {
        let runtime = Arc::new(MockAgentRuntime::new());
        let manager = Arc::new(BackgroundAgentManager::new(
            runtime.clone(),
            "/messaging-sw.js",
            "/",
        ));

        let (a, b) = tokio::join!(manager.ensure_agent(), manager.ensure_agent());
        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(runtime.register_calls(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_short_circuits() {
        let runtime = Arc::new(MockAgentRuntime::unsupported());
        let manager = BackgroundAgentManager::new(runtime.clone(), "/messaging-sw.js", "/");

        let err = manager.ensure_agent().await.unwrap_err();
        assert_eq!(err, AgentError::Unsupported);
        assert_eq!(runtime.get_registration_calls(), 0);
        assert!(matches!(
            FailureReason::from(err),
            FailureReason::AgentUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_install_failure_is_reported() {
        let runtime = Arc::new(MockAgentRuntime::failing_install("script 404"));
        let manager = BackgroundAgentManager::new(runtime, "/messaging-sw.js", "/");

        let err = manager.ensure_agent().await.unwrap_err();
        assert!(matches!(err, AgentError::Install(ref m) if m.contains("script 404")));
    }
}
