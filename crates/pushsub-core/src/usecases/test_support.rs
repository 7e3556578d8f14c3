//! In-memory port implementations shared by the use case tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::{AgentId, PermissionState, SubscriptionToken};
use crate::ports::{
    Ack, AgentHandle, AgentState, IAgentRuntime, IPermissionSource, IPushProvider,
    ISubscriptionBackend,
};

pub fn active_agent() -> AgentHandle {
    AgentHandle::new(
        AgentId::new("agent-1"),
        "/",
        "/messaging-sw.js",
        AgentState::Active,
    )
}

// ============================================================================
// Permission
// ============================================================================

pub struct MockPermission {
    state: Mutex<PermissionState>,
    prompt_answer: PermissionState,
    supported: bool,
    prompt_error: Option<String>,
    request_calls: AtomicUsize,
    events: Option<watch::Sender<PermissionState>>,
}

impl MockPermission {
    fn build(state: PermissionState, prompt_answer: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
            prompt_answer,
            supported: true,
            prompt_error: None,
            request_calls: AtomicUsize::new(0),
            events: None,
        }
    }

    pub fn granted() -> Self {
        Self::build(PermissionState::Granted, PermissionState::Granted)
    }

    pub fn denied() -> Self {
        Self::build(PermissionState::Denied, PermissionState::Denied)
    }

    /// Undecided; the prompt resolves to `answer`
    pub fn undetermined(answer: PermissionState) -> Self {
        Self::build(PermissionState::Undetermined, answer)
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::build(PermissionState::Undetermined, PermissionState::Undetermined)
        }
    }

    /// Undecided; the prompt raises `error` instead of answering
    pub fn failing_prompt(error: &str) -> Self {
        Self {
            prompt_error: Some(error.to_string()),
            ..Self::build(PermissionState::Undetermined, PermissionState::Undetermined)
        }
    }

    /// Emits change events instead of requiring polling
    pub fn with_events(mut self) -> Self {
        let current = *self.state.lock().unwrap();
        let (tx, _rx) = watch::channel(current);
        self.events = Some(tx);
        self
    }

    /// Changes the decision out-of-band, like a settings page would
    pub fn set(&self, state: PermissionState) {
        *self.state.lock().unwrap() = state;
        if let Some(tx) = &self.events {
            tx.send_replace(state);
        }
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IPermissionSource for MockPermission {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn current(&self) -> PermissionState {
        *self.state.lock().unwrap()
    }

    async fn request(&self) -> anyhow::Result<PermissionState> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.prompt_error {
            anyhow::bail!("{error}");
        }
        let current = self.current();
        if current.is_decided() {
            return Ok(current);
        }
        self.set(self.prompt_answer);
        Ok(self.prompt_answer)
    }

    fn subscribe_changes(&self) -> Option<watch::Receiver<PermissionState>> {
        self.events.as_ref().map(|tx| tx.subscribe())
    }
}

// ============================================================================
// Agent runtime
// ============================================================================

pub struct MockAgentRuntime {
    supported: bool,
    registered: Mutex<Option<AgentHandle>>,
    install_error: Option<String>,
    activation_delay: Duration,
    get_calls: AtomicUsize,
    register_calls: AtomicUsize,
    wait_calls: AtomicUsize,
}

impl MockAgentRuntime {
    pub fn new() -> Self {
        Self {
            supported: true,
            registered: Mutex::new(None),
            install_error: None,
            activation_delay: Duration::ZERO,
            get_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            wait_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_existing(state: AgentState) -> Self {
        let runtime = Self::new();
        *runtime.registered.lock().unwrap() = Some(AgentHandle::new(
            AgentId::new("existing-agent"),
            "/",
            "/messaging-sw.js",
            state,
        ));
        runtime
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    pub fn failing_install(message: &str) -> Self {
        Self {
            install_error: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Activation suspends for `delay`, keeping a sequence in flight
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.activation_delay = delay;
        self
    }

    pub fn get_registration_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn wait_calls(&self) -> usize {
        self.wait_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IAgentRuntime for MockAgentRuntime {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn get_registration(&self, _scope: &str) -> anyhow::Result<Option<AgentHandle>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.registered.lock().unwrap().clone())
    }

    async fn register(&self, script_url: &str, scope: &str) -> anyhow::Result<AgentHandle> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.install_error {
            anyhow::bail!("{message}");
        }
        let handle = AgentHandle::new(
            AgentId::new("agent-1"),
            scope,
            script_url,
            AgentState::Installing,
        );
        *self.registered.lock().unwrap() = Some(handle.clone());
        Ok(handle)
    }

    async fn wait_until_active(&self, agent: &AgentHandle) -> anyhow::Result<AgentHandle> {
        self.wait_calls.fetch_add(1, Ordering::SeqCst);
        if !self.activation_delay.is_zero() {
            tokio::time::sleep(self.activation_delay).await;
        }
        let active = AgentHandle {
            state: AgentState::Active,
            ..agent.clone()
        };
        *self.registered.lock().unwrap() = Some(active.clone());
        Ok(active)
    }
}

// ============================================================================
// Push provider
// ============================================================================

/// One scripted provider response
pub enum TokenStep {
    Token(String),
    Fail(String),
    /// The user blocks notifications while the fetch is running
    DenyAndFail,
}

impl TokenStep {
    pub fn token(value: &str) -> Self {
        TokenStep::Token(value.to_string())
    }

    pub fn fail(message: &str) -> Self {
        TokenStep::Fail(message.to_string())
    }
}

pub struct MockPushProvider {
    steps: Mutex<VecDeque<TokenStep>>,
    permission: Option<Arc<MockPermission>>,
    calls: AtomicUsize,
}

impl MockPushProvider {
    pub fn new(steps: Vec<TokenStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            permission: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Prompts through `permission` when undecided, like real providers do
    pub fn with_permission(mut self, permission: Arc<MockPermission>) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IPushProvider for MockPushProvider {
    async fn get_token(&self, _agent: &AgentHandle) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(permission) = &self.permission {
            if !permission.current().is_decided() {
                permission.request().await?;
            }
        }
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(TokenStep::Token(token)) => Ok(token),
            Some(TokenStep::Fail(message)) => anyhow::bail!("{message}"),
            Some(TokenStep::DenyAndFail) => {
                if let Some(permission) = &self.permission {
                    permission.set(PermissionState::Denied);
                }
                anyhow::bail!("messaging/permission-blocked")
            }
            None => anyhow::bail!("no scripted response"),
        }
    }
}

// ============================================================================
// Subscription backend
// ============================================================================

pub struct MockBackend {
    bind_response: Result<Ack, String>,
    unbind_response: Result<Ack, String>,
    bind_calls: Mutex<Vec<String>>,
    unbind_calls: Mutex<Vec<String>>,
}

impl MockBackend {
    fn build(response: Result<Ack, String>) -> Self {
        Self {
            bind_response: response.clone(),
            unbind_response: response,
            bind_calls: Mutex::new(Vec::new()),
            unbind_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn confirming() -> Self {
        Self::build(Ok(Ack::confirmed("Subscribed to topic: all-users")))
    }

    /// 2xx with `success: false`
    pub fn unconfirmed(message: &str) -> Self {
        Self::build(Ok(Ack {
            status: 200,
            success: false,
            message: None,
            error: Some(message.to_string()),
        }))
    }

    pub fn rejecting(status: u16, error: &str) -> Self {
        Self::build(Ok(Ack::rejected(status, error)))
    }

    pub fn unreachable(message: &str) -> Self {
        Self::build(Err(message.to_string()))
    }

    pub fn bind_calls(&self) -> Vec<String> {
        self.bind_calls.lock().unwrap().clone()
    }

    pub fn unbind_calls(&self) -> Vec<String> {
        self.unbind_calls.lock().unwrap().clone()
    }

    fn respond(response: &Result<Ack, String>) -> anyhow::Result<Ack> {
        match response {
            Ok(ack) => Ok(ack.clone()),
            Err(message) => anyhow::bail!("{message}"),
        }
    }
}

#[async_trait]
impl ISubscriptionBackend for MockBackend {
    async fn bind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack> {
        self.bind_calls
            .lock()
            .unwrap()
            .push(token.as_str().to_string());
        Self::respond(&self.bind_response)
    }

    async fn unbind(&self, token: &SubscriptionToken) -> anyhow::Result<Ack> {
        self.unbind_calls
            .lock()
            .unwrap()
            .push(token.as_str().to_string());
        Self::respond(&self.unbind_response)
    }
}
