//! Background agent runtime port (driven/secondary port)
//!
//! Registration and activation of the background delivery agent (the
//! script that receives push messages while no page is open).
//!
//! ## Design Notes
//!
//! - Registrations are scoped; registering the same script twice for the
//!   same scope is idempotent on every supported platform, so adapters do
//!   not need to guard against redundant calls.
//! - `wait_until_active` suspends until the agent reports itself active
//!   and in control of the page.

use serde::{Deserialize, Serialize};

use crate::domain::AgentId;

// ============================================================================
// AgentState and AgentHandle
// ============================================================================

/// Lifecycle state reported by the agent runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Script is being installed
    Installing,
    /// Installed, waiting to take control
    Waiting,
    /// Active and controlling the page
    Active,
    /// Replaced by a newer registration
    Redundant,
}

impl AgentState {
    /// Returns true if the agent can receive messages
    pub fn is_active(&self) -> bool {
        matches!(self, AgentState::Active)
    }
}

/// A registered background agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHandle {
    /// Runtime-assigned identity of the registration
    pub id: AgentId,
    /// Scope the agent controls (e.g. `/`)
    pub scope: String,
    /// URL of the agent script
    pub script_url: String,
    /// Lifecycle state when the handle was produced
    pub state: AgentState,
}

impl AgentHandle {
    /// Creates a handle
    pub fn new(
        id: AgentId,
        scope: impl Into<String>,
        script_url: impl Into<String>,
        state: AgentState,
    ) -> Self {
        Self {
            id,
            scope: scope.into(),
            script_url: script_url.into(),
            state,
        }
    }

    /// Returns true if the agent is active
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

// ============================================================================
// IAgentRuntime trait
// ============================================================================

/// Port trait for the platform's background agent registry
#[async_trait::async_trait]
pub trait IAgentRuntime: Send + Sync {
    /// Returns false if the environment cannot run background agents
    fn is_supported(&self) -> bool;

    /// Looks up an existing registration for `scope`
    async fn get_registration(&self, scope: &str) -> anyhow::Result<Option<AgentHandle>>;

    /// Installs `script_url` with the given scope
    async fn register(&self, script_url: &str, scope: &str) -> anyhow::Result<AgentHandle>;

    /// Suspends until the agent is active, returning its refreshed handle
    async fn wait_until_active(&self, agent: &AgentHandle) -> anyhow::Result<AgentHandle>;
}
