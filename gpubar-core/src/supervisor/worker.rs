//! Poll cycle driven by the supervisor's background task

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

use super::policy::RetryPolicy;
use super::state::{ConnectionState, ConnectionStatus};
use super::{GpuEvent, SupervisorConfig};
use crate::classify::classify;
use crate::monitoring::RemoteMetricsClient;
use crate::target::Target;

/// Target selection shared between the worker and external setters
#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) target: Target,
    /// Bumped on every `set_target`, even to the same target
    pub(crate) generation: u64,
}

pub(crate) type SharedSession = Arc<Mutex<Session>>;

pub(crate) fn read_session(session: &SharedSession) -> (Target, u64) {
    let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
    (guard.target.clone(), guard.generation)
}

/// Owns the session state and runs one poll cycle per wake
pub(crate) struct PollWorker {
    session: SharedSession,
    client: RemoteMetricsClient,
    policy: RetryPolicy,
    events: mpsc::Sender<GpuEvent>,
    state: ConnectionState,
    generation: u64,
}

impl PollWorker {
    pub(crate) fn new(
        session: SharedSession,
        client: RemoteMetricsClient,
        policy: RetryPolicy,
        events: mpsc::Sender<GpuEvent>,
    ) -> Self {
        Self {
            session,
            client,
            policy,
            events,
            state: ConnectionState::idle(),
            generation: 0,
        }
    }

    #[cfg(test)]
    pub(crate) const fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Runs until shutdown, or until the event receiver is dropped
    pub(crate) async fn run(
        mut self,
        config: SupervisorConfig,
        mut wake_rx: mpsc::Receiver<()>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let forced = tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
                Some(()) = wake_rx.recv() => true,
                _ = ticker.tick() => false,
            };

            if !self.cycle(forced).await {
                tracing::debug!("Event receiver dropped, stopping poll worker");
                break;
            }
        }
        tracing::debug!("Poll worker stopped");
    }

    /// Executes one poll cycle. Returns `false` once nobody is listening.
    pub(crate) async fn cycle(&mut self, forced: bool) -> bool {
        let (target, generation) = read_session(&self.session);

        if target.is_empty() {
            if self.state.status() != ConnectionStatus::Idle {
                tracing::info!("Monitoring target cleared");
            }
            self.state = ConnectionState::idle();
            self.generation = generation;
            return self.emit_meta().await;
        }

        let mut forced = forced;
        if generation != self.generation || self.state.target() != &target {
            tracing::info!(host = %target, "Starting monitoring session");
            self.state = ConnectionState::connecting(target.clone());
            self.generation = generation;
            forced = true;
        }

        if !forced && self.state.retry_pending(Instant::now()) {
            return self.emit_meta().await;
        }

        if !self.state.has_succeeded() {
            self.state.mark_connecting();
            if !self.emit_meta().await {
                return false;
            }
        }

        let result = self.client.query(&target).await;

        if read_session(&self.session).1 != generation {
            tracing::debug!(host = %target, "Target changed during query, discarding result");
            return true;
        }

        let previous = self.state.status();
        match result {
            Ok(snapshot) => {
                self.state.record_success(Utc::now());
                tracing::debug!(host = %target, gpus = snapshot.len(), "GPU query succeeded");
                self.log_transition(previous);
                if !self.emit(GpuEvent::Snapshot(snapshot)).await {
                    return false;
                }
            }
            Err(err) => {
                let classified = classify(&err.to_string());
                self.state
                    .record_failure(classified.clone(), Instant::now(), &self.policy);
                tracing::debug!(
                    host = %target,
                    code = %classified.code,
                    failures = self.state.consecutive_failures(),
                    error = %err,
                    "GPU query failed"
                );
                self.log_transition(previous);
                if !self.emit(GpuEvent::Error(classified.message)).await {
                    return false;
                }
            }
        }
        self.emit_meta().await
    }

    fn log_transition(&self, previous: ConnectionStatus) {
        let current = self.state.status();
        if current != previous {
            tracing::info!(
                host = %self.state.target(),
                from = %previous,
                to = %current,
                failures = self.state.consecutive_failures(),
                "Connection status changed"
            );
        }
    }

    async fn emit_meta(&self) -> bool {
        self.emit(GpuEvent::Meta(self.state.meta(Instant::now())))
            .await
    }

    async fn emit(&self, event: GpuEvent) -> bool {
        self.events.send(event).await.is_ok()
    }
}
