//! Connection supervision
//!
//! One long-lived background task owns the session state machine for the
//! single active target. Callers talk to it through a cloneable
//! [`ConnectionSupervisor`] handle and observe it through the
//! [`GpuEvent`] channel returned by [`ConnectionSupervisor::start`].
//!
//! Forced wakes coalesce in a single-slot channel: while one wake is pending,
//! further requests are dropped.

mod policy;
mod state;
mod worker;

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

pub use policy::{DEFAULT_BACKOFF_SECS, DEFAULT_ERROR_THRESHOLD, MIN_RETRY_DELAY, RetryPolicy};
pub use state::{ConnectionMeta, ConnectionState, ConnectionStatus};

use crate::monitoring::{GpuSnapshot, RemoteMetricsClient};
use crate::target::Target;
use crate::testing::{ConnectionTestResult, ConnectionTester};
use worker::{PollWorker, SharedSession, read_session};

/// Default period of the poll timer
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of the event channel
const EVENT_BUFFER: usize = 64;

/// Event pushed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum GpuEvent {
    /// A complete snapshot from a successful query
    #[serde(rename = "gpu:data")]
    Snapshot(GpuSnapshot),
    /// Human-readable message for a failed attempt
    #[serde(rename = "gpu:error")]
    Error(String),
    /// Connection metadata after every cycle
    #[serde(rename = "gpu:conn_meta")]
    Meta(ConnectionMeta),
}

/// Supervisor tuning
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Period of the poll timer
    pub poll_interval: Duration,
    /// Backoff table and error threshold
    pub policy: RetryPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            policy: RetryPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    /// Sets the poll period; zero is raised to one millisecond
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Sets the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[derive(Debug)]
struct Signals {
    wake: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
}

/// Handle to the background poll worker.
///
/// Clones share the same worker. The worker stops when [`shutdown`] is
/// called, when every handle is dropped, or when the event receiver is
/// dropped.
///
/// [`shutdown`]: ConnectionSupervisor::shutdown
#[derive(Debug, Clone)]
pub struct ConnectionSupervisor {
    session: SharedSession,
    signals: Arc<Signals>,
    tester: ConnectionTester,
}

impl ConnectionSupervisor {
    /// Spawns the poll worker on the current tokio runtime.
    ///
    /// The session starts idle.
    #[must_use]
    pub fn start(
        config: SupervisorConfig,
        client: RemoteMetricsClient,
    ) -> (Self, mpsc::Receiver<GpuEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let session = SharedSession::default();

        let worker = PollWorker::new(
            session.clone(),
            client.clone(),
            config.policy.clone(),
            event_tx,
        );
        tracing::debug!(
            interval_ms = config.poll_interval.as_millis(),
            threshold = config.policy.error_threshold(),
            "Starting connection supervisor"
        );
        tokio::spawn(worker.run(config, wake_rx, shutdown_rx));

        let handle = Self {
            session,
            signals: Arc::new(Signals {
                wake: wake_tx,
                shutdown: shutdown_tx,
            }),
            tester: ConnectionTester::new(client),
        };
        (handle, event_rx)
    }

    /// Selects the active target and forces an immediate attempt.
    ///
    /// The host is trimmed; an empty host clears the session. The session
    /// state is reset even when the target is unchanged.
    pub fn set_target(&self, host: &str, port: i64) {
        let target = Target::new(host, port);
        {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            tracing::debug!(host = %target, "Target set");
            session.target = target;
            session.generation = session.generation.wrapping_add(1);
        }
        self.wake();
    }

    /// Forces an immediate attempt without changing the target
    pub fn retry_now(&self) {
        self.wake();
    }

    /// Probes a target once without touching the session
    pub async fn test_target(&self, host: &str, port: i64) -> ConnectionTestResult {
        self.tester.test_target(host, port).await
    }

    /// Currently selected target
    #[must_use]
    pub fn target(&self) -> Target {
        read_session(&self.session).0
    }

    /// Stops the worker at its next wake point. An in-flight query is
    /// allowed to finish.
    pub fn shutdown(&self) {
        tracing::debug!("Connection supervisor shutdown requested");
        self.signals.shutdown.send_replace(true);
    }

    fn wake(&self) {
        // A full slot means a wake is already owed
        if let Err(mpsc::error::TrySendError::Closed(())) = self.signals.wake.try_send(()) {
            tracing::debug!("Wake dropped, poll worker has stopped");
        }
    }
}
