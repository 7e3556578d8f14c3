//! Permission-change watcher
//!
//! Keeps a permission status indicator current while the decision changes
//! outside the orchestrator (a settings page, another tab). Uses the
//! platform's change events when available and falls back to polling
//! [`IPermissionSource::current`] at a fixed interval otherwise.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::OrchestratorConfig;
use crate::domain::PermissionState;
use crate::ports::IPermissionSource;

/// How changes are being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    /// Platform change events
    Events,
    /// Degraded mode: periodic reads
    Polling,
}

/// A running permission watch
pub struct PermissionWatch {
    pub mode: WatchMode,
    pub receiver: watch::Receiver<PermissionState>,
    /// Polling task; `None` in event mode
    pub handle: Option<JoinHandle<()>>,
}

/// Shortest polling period; `tokio::time::interval` rejects zero
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Starts permission watches
pub struct PermissionWatcher {
    source: Arc<dyn IPermissionSource>,
    poll_interval: Duration,
}

impl PermissionWatcher {
    /// Creates a watcher; `poll_interval` is clamped to at least 1ms
    pub fn new(source: Arc<dyn IPermissionSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Creates a watcher polling at `permission_poll_interval_ms`
    pub fn from_config(source: Arc<dyn IPermissionSource>, config: &OrchestratorConfig) -> Self {
        Self::new(source, config.permission_poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Starts watching until `cancel` fires
    ///
    /// Must be called inside a Tokio runtime when polling is needed.
    pub fn start(&self, cancel: CancellationToken) -> PermissionWatch {
        if let Some(receiver) = self.source.subscribe_changes() {
            debug!("Watching permission via platform events");
            return PermissionWatch {
                mode: WatchMode::Events,
                receiver,
                handle: None,
            };
        }

        info!(interval = ?self.poll_interval, "No permission events, falling back to polling");
        let (tx, receiver) = watch::channel(self.source.current());
        let source = Arc::clone(&self.source);
        let period = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tx.closed() => break,
                    _ = ticker.tick() => {
                        let state = source.current();
                        tx.send_if_modified(|current| {
                            if *current == state {
                                return false;
                            }
                            debug!(from = %current, to = %state, "Permission changed");
                            *current = state;
                            true
                        });
                    }
                }
            }
            debug!("Permission polling stopped");
        });

        PermissionWatch {
            mode: WatchMode::Polling,
            receiver,
            handle: Some(handle),
        }
    }
}
