//! Subscription orchestrator use case
//!
//! Runs the subscribe and unsubscribe sequences. Every step is an effect
//! (prompt, agent setup, token fetch, network call) whose outcome is turned
//! into a [`StatusEvent`] and fed through the pure transition function
//! [`OrchestrationStatus::apply`]. The effect code never sets a status
//! directly.
//!
//! ## Design Notes
//!
//! - At most one sequence is in flight per orchestrator. A second trigger
//!   while one runs is ignored and reported as [`SequenceOutcome::AlreadyRunning`].
//! - The orchestrator never touches the user profile. A finished sequence
//!   returns a [`SequenceReport`] carrying the [`ProfileUpdate`] for the
//!   caller to apply.
//! - Status changes are published on a `watch` channel; a dropped receiver
//!   is not an error.
//! - Every failure ends in `Failed(reason)`; nothing escapes as `Err`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{OrchestratorConfig, PermissionStrategy};
use crate::domain::{
    DeviceProfile, FailureReason, Flow, OrchestrationStatus, PermissionState, ProfileUpdate,
    SequenceId, StatusEvent, SubscriptionToken,
};
use crate::ports::{
    AgentHandle, IAgentRuntime, IPermissionSource, IPushProvider, ISubscriptionBackend,
};

use super::ensure_agent::BackgroundAgentManager;
use super::fetch_token::TokenProvider;

// ============================================================================
// Settings
// ============================================================================

/// Runtime knobs for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub permission_strategy: PermissionStrategy,
    pub token_max_attempts: u32,
    pub token_retry_delay: Duration,
    pub ios_stabilization_delay: Duration,
    pub agent_script_url: String,
    pub agent_scope: String,
    pub sequence_timeout: Option<Duration>,
}

impl From<&OrchestratorConfig> for OrchestratorSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            permission_strategy: config.permission_strategy,
            token_max_attempts: config.token_max_attempts,
            token_retry_delay: config.token_retry_delay(),
            ios_stabilization_delay: config.ios_stabilization_delay(),
            agent_script_url: config.agent_script_url.clone(),
            agent_scope: config.agent_scope.clone(),
            sequence_timeout: config.sequence_timeout(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

// ============================================================================
// SequenceReport / SequenceOutcome
// ============================================================================

/// Summary of one finished sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub id: SequenceId,
    pub flow: Flow,
    /// Terminal status the sequence ended in
    pub status: OrchestrationStatus,
    /// Token-fetch attempts made (0 if the fetch never started)
    pub token_attempts: u32,
    /// Change the caller should apply to its profile, if any
    pub profile_update: Option<ProfileUpdate>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SequenceReport {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Toast/walkthrough text for the terminal status
    pub fn user_message(&self) -> Option<String> {
        self.status.user_message()
    }
}

/// Result of triggering a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// The sequence ran to a terminal status
    Completed(SequenceReport),
    /// Another sequence was in flight; this trigger was ignored
    AlreadyRunning,
}

impl SequenceOutcome {
    pub fn report(&self) -> Option<&SequenceReport> {
        match self {
            SequenceOutcome::Completed(report) => Some(report),
            SequenceOutcome::AlreadyRunning => None,
        }
    }

    pub fn into_report(self) -> Option<SequenceReport> {
        match self {
            SequenceOutcome::Completed(report) => Some(report),
            SequenceOutcome::AlreadyRunning => None,
        }
    }
}

// ============================================================================
// In-flight guard
// ============================================================================

/// Holds the re-entrancy flag for the duration of one sequence
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Mutable bookkeeping for the sequence being executed
struct SequenceRun {
    id: SequenceId,
    flow: Flow,
    status: OrchestrationStatus,
    token_attempts: u32,
    profile_update: Option<ProfileUpdate>,
    started_at: DateTime<Utc>,
}

impl SequenceRun {
    fn new(flow: Flow) -> Self {
        Self {
            id: SequenceId::new(),
            flow,
            status: OrchestrationStatus::Idle,
            token_attempts: 0,
            profile_update: None,
            started_at: Utc::now(),
        }
    }

    fn finish(self) -> SequenceReport {
        SequenceReport {
            id: self.id,
            flow: self.flow,
            status: self.status,
            token_attempts: self.token_attempts,
            profile_update: self.profile_update,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

// ============================================================================
// SubscriptionOrchestrator
// ============================================================================

/// Drives the push subscription state machine
pub struct SubscriptionOrchestrator {
    device: DeviceProfile,
    permission: Arc<dyn IPermissionSource>,
    backend: Arc<dyn ISubscriptionBackend>,
    agents: BackgroundAgentManager,
    tokens: TokenProvider,
    settings: OrchestratorSettings,
    in_flight: AtomicBool,
    status: watch::Sender<OrchestrationStatus>,
}

impl SubscriptionOrchestrator {
    /// Creates an orchestrator with explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `device` - Session device profile, detected once by the caller
    /// * `permission` - Platform permission API
    /// * `agent_runtime` - Background agent registry
    /// * `push_provider` - Token issuer
    /// * `backend` - Bind/unbind endpoints
    /// * `settings` - Strategy, retry and delay knobs
    pub fn new(
        device: DeviceProfile,
        permission: Arc<dyn IPermissionSource>,
        agent_runtime: Arc<dyn IAgentRuntime>,
        push_provider: Arc<dyn IPushProvider>,
        backend: Arc<dyn ISubscriptionBackend>,
        settings: OrchestratorSettings,
    ) -> Self {
        let agents = BackgroundAgentManager::new(
            agent_runtime,
            settings.agent_script_url.clone(),
            settings.agent_scope.clone(),
        );
        let tokens = TokenProvider::new(
            push_provider,
            Arc::clone(&permission),
            settings.token_max_attempts,
            settings.token_retry_delay,
        );
        let (status, _) = watch::channel(OrchestrationStatus::Idle);

        Self {
            device,
            permission,
            backend,
            agents,
            tokens,
            settings,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    /// Latest published status
    pub fn status(&self) -> OrchestrationStatus {
        self.status.borrow().clone()
    }

    /// Receiver for status changes
    pub fn subscribe_status(&self) -> watch::Receiver<OrchestrationStatus> {
        self.status.subscribe()
    }

    /// Returns true while a sequence is running
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    /// Runs the subscribe sequence
    ///
    /// On success the report carries `ProfileUpdate::SetToken` with the
    /// bound token.
    pub async fn subscribe(&self) -> SequenceOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Subscribe ignored, a sequence is already in flight");
            return SequenceOutcome::AlreadyRunning;
        };

        let mut run = self.begin(Flow::Subscribe);
        let outcome = self.watchdog(self.run_subscribe(&mut run)).await;
        if let Err(limit) = outcome {
            self.time_out(&mut run, limit);
        }
        SequenceOutcome::Completed(self.finish(run))
    }

    /// Runs the unsubscribe sequence
    ///
    /// Reuses `cached_token` when given, otherwise sets up the agent and
    /// fetches a fresh token first. On a confirmed unbind the report carries
    /// `ProfileUpdate::ClearToken`; any other outcome leaves the profile alone.
    pub async fn unsubscribe(&self, cached_token: Option<SubscriptionToken>) -> SequenceOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Unsubscribe ignored, a sequence is already in flight");
            return SequenceOutcome::AlreadyRunning;
        };

        let mut run = self.begin(Flow::Unsubscribe);
        let outcome = self
            .watchdog(self.run_unsubscribe(&mut run, cached_token))
            .await;
        if let Err(limit) = outcome {
            self.time_out(&mut run, limit);
        }
        SequenceOutcome::Completed(self.finish(run))
    }

    // ------------------------------------------------------------------------
    // Sequence plumbing
    // ------------------------------------------------------------------------

    fn begin(&self, flow: Flow) -> SequenceRun {
        let run = SequenceRun::new(flow);
        info!(sequence = %run.id, %flow, "Starting sequence");
        self.status.send_replace(OrchestrationStatus::Idle);
        run
    }

    fn finish(&self, run: SequenceRun) -> SequenceReport {
        let report = run.finish();
        match report.status.failure() {
            Some(reason) if reason.is_user_decision() => {
                info!(sequence = %report.id, flow = %report.flow, %reason, "Sequence ended by user decision")
            }
            Some(reason) => {
                warn!(sequence = %report.id, flow = %report.flow, %reason, "Sequence failed")
            }
            None => {
                info!(sequence = %report.id, flow = %report.flow, status = %report.status, "Sequence finished")
            }
        }
        report
    }

    /// Runs `sequence` under the optional watchdog
    ///
    /// Returns the elapsed limit when the watchdog fired first.
    async fn watchdog<F>(&self, sequence: F) -> Result<(), Duration>
    where
        F: std::future::Future<Output = ()>,
    {
        match self.settings.sequence_timeout {
            Some(limit) => tokio::time::timeout(limit, sequence)
                .await
                .map_err(|_| limit),
            None => {
                sequence.await;
                Ok(())
            }
        }
    }

    fn time_out(&self, run: &mut SequenceRun, limit: Duration) {
        warn!(sequence = %run.id, ?limit, "Sequence watchdog fired");
        self.advance(run, StatusEvent::TimedOut);
    }

    /// Feeds `event` through the transition function and publishes the result
    ///
    /// Returns true while the sequence should keep going.
    fn advance(&self, run: &mut SequenceRun, event: StatusEvent) -> bool {
        let event_name = event.name();
        let next = match run.status.apply(event) {
            Ok(next) => next,
            Err(e) => {
                warn!(sequence = %run.id, error = %e, "Rejected status transition");
                OrchestrationStatus::Failed(FailureReason::Internal(e.to_string()))
            }
        };

        debug!(
            sequence = %run.id,
            event = event_name,
            from = run.status.name(),
            to = next.name(),
            progress = next.progress_percent(),
            "Status transition"
        );
        run.status = next.clone();
        self.status.send_replace(next);
        run.status.is_in_flight()
    }

    // ------------------------------------------------------------------------
    // Subscribe
    // ------------------------------------------------------------------------

    async fn run_subscribe(&self, run: &mut SequenceRun) {
        let requires_install = self.device.requires_install();
        if !self.advance(run, StatusEvent::SubscribeRequested { requires_install }) {
            debug!(platform = %self.device.platform, "Install required before subscribing");
            return;
        }

        let permission_event = self.resolve_permission().await;
        if !self.advance(run, permission_event) {
            return;
        }

        let Some(agent) = self.prepare_agent(run).await else {
            return;
        };
        if !self.advance(run, StatusEvent::AgentReady) {
            return;
        }

        let token = match self.tokens.fetch_token(&agent).await {
            Ok(issued) => {
                run.token_attempts = issued.attempts;
                issued.token
            }
            Err(e) => {
                run.token_attempts = e.attempts();
                self.advance(run, StatusEvent::TokenFailed(e.into()));
                return;
            }
        };
        if !self.advance(run, StatusEvent::TokenIssued) {
            return;
        }

        let event = match self.backend.bind(&token).await {
            Ok(ack) if ack.is_confirmed() => StatusEvent::BindConfirmed,
            Ok(ack) => StatusEvent::BindRejected(ack.failure_message()),
            Err(e) => StatusEvent::BindRejected(format!("{e:#}")),
        };
        self.advance(run, event);

        if run.status == OrchestrationStatus::Success {
            info!(token = %token.redacted(), "Token bound to topic");
            run.profile_update = Some(ProfileUpdate::SetToken(token));
        }
    }

    /// Produces the permission event according to the configured strategy
    async fn resolve_permission(&self) -> StatusEvent {
        if !self.permission.is_supported() {
            return StatusEvent::NotificationsUnsupported;
        }

        match self.settings.permission_strategy {
            PermissionStrategy::RequestUpFront => match self.permission.request().await {
                Ok(state) => StatusEvent::PermissionResolved(state),
                Err(e) => {
                    let detail = format!("{e:#}");
                    warn!(error = %detail, "Permission prompt failed");
                    StatusEvent::PermissionPromptFailed(detail)
                }
            },
            PermissionStrategy::DeferToTokenFetch => match self.permission.current() {
                PermissionState::Undetermined => StatusEvent::PermissionDeferred,
                decided => StatusEvent::PermissionResolved(decided),
            },
        }
    }

    /// Ensures the agent, applying the iOS stabilization delay
    ///
    /// Publishes `AgentFailed` and returns `None` on failure.
    async fn prepare_agent(&self, run: &mut SequenceRun) -> Option<AgentHandle> {
        match self.agents.ensure_agent().await {
            Ok(agent) => {
                if self.device.needs_stabilization_delay()
                    && !self.settings.ios_stabilization_delay.is_zero()
                {
                    debug!(delay = ?self.settings.ios_stabilization_delay, "Waiting for agent to settle");
                    tokio::time::sleep(self.settings.ios_stabilization_delay).await;
                }
                Some(agent)
            }
            Err(e) => {
                self.advance(run, StatusEvent::AgentFailed(e.to_string()));
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Unsubscribe
    // ------------------------------------------------------------------------

    async fn run_unsubscribe(&self, run: &mut SequenceRun, cached: Option<SubscriptionToken>) {
        if !self.advance(run, StatusEvent::UnsubscribeRequested) {
            return;
        }

        let token = match cached {
            Some(token) => token,
            None => {
                debug!("No cached token, fetching a fresh one to unbind");
                let Some(agent) = self.prepare_agent(run).await else {
                    return;
                };
                match self.tokens.fetch_token(&agent).await {
                    Ok(issued) => {
                        run.token_attempts = issued.attempts;
                        issued.token
                    }
                    Err(e) => {
                        run.token_attempts = e.attempts();
                        self.advance(run, StatusEvent::TokenFailed(e.into()));
                        return;
                    }
                }
            }
        };

        let event = match self.backend.unbind(&token).await {
            Ok(ack) if ack.is_confirmed() => StatusEvent::UnbindConfirmed,
            Ok(ack) => StatusEvent::UnbindRejected(ack.failure_message()),
            Err(e) => StatusEvent::UnbindRejected(format!("{e:#}")),
        };
        self.advance(run, event);

        if run.status == OrchestrationStatus::Unsubscribed {
            run.profile_update = Some(ProfileUpdate::ClearToken);
        }
    }
}
