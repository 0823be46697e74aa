//! Connection session state machine
//!
//! [`ConnectionState`] holds everything the supervisor knows about the active
//! session. Status transitions depend only on the previous status, the
//! outcome of the attempt, the failure count, and whether the session has
//! ever succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::policy::{MIN_RETRY_DELAY, RetryPolicy};
use crate::classify::{Classified, ErrorCode};
use crate::target::Target;

/// Connection status shown to observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No target selected
    #[default]
    Idle,
    /// Attempting to reach a target that has not answered yet this session
    Connecting,
    /// Last attempt succeeded
    Live,
    /// Recent failures after an earlier success
    Stale,
    /// Never succeeded, or failed too many times in a row
    Error,
}

impl ConnectionStatus {
    /// Status after a failed attempt.
    ///
    /// `failures` is the count including the attempt that just failed.
    #[must_use]
    pub const fn after_failure(has_succeeded: bool, failures: u32, threshold: u32) -> Self {
        if has_succeeded && failures < threshold {
            Self::Stale
        } else {
            Self::Error
        }
    }

    /// Lowercase wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Live => "live",
            Self::Stale => "stale",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state of one monitoring session
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    status: ConnectionStatus,
    last_success: Option<DateTime<Utc>>,
    consecutive_failures: u32,
    next_retry: Option<Instant>,
    last_error: Option<Classified>,
    active: Target,
}

impl ConnectionState {
    /// State with no target
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh session for `target`, before any attempt
    #[must_use]
    pub fn connecting(target: Target) -> Self {
        Self {
            status: ConnectionStatus::Connecting,
            active: target,
            ..Self::default()
        }
    }

    /// Current status
    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Target this state belongs to
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.active
    }

    /// Consecutive failed attempts
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Time of the last successful query this session
    #[must_use]
    pub const fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Classification of the last failure, cleared on success
    #[must_use]
    pub const fn last_error(&self) -> Option<&Classified> {
        self.last_error.as_ref()
    }

    /// Whether any attempt has succeeded this session
    #[must_use]
    pub const fn has_succeeded(&self) -> bool {
        self.last_success.is_some()
    }

    /// Pending retry deadline, if any
    #[must_use]
    pub const fn next_retry(&self) -> Option<Instant> {
        self.next_retry
    }

    /// Whether a retry deadline is set and still in the future
    #[must_use]
    pub fn retry_pending(&self, now: Instant) -> bool {
        self.next_retry.is_some_and(|deadline| deadline > now)
    }

    /// Marks an attempt in flight for a session that has not succeeded yet
    pub fn mark_connecting(&mut self) {
        if !self.has_succeeded() {
            self.status = ConnectionStatus::Connecting;
        }
    }

    /// Records a successful query
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.status = ConnectionStatus::Live;
        self.consecutive_failures = 0;
        self.next_retry = None;
        self.last_success = Some(at);
        self.last_error = None;
    }

    /// Records a failed query and schedules the next retry
    pub fn record_failure(&mut self, error: Classified, now: Instant, policy: &RetryPolicy) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = policy
            .delay_for(self.consecutive_failures)
            .max(MIN_RETRY_DELAY);
        self.next_retry = Some(now + delay);
        self.status = ConnectionStatus::after_failure(
            self.has_succeeded(),
            self.consecutive_failures,
            policy.error_threshold(),
        );
        self.last_error = Some(error);
    }

    /// Snapshot of the state for observers
    #[must_use]
    pub fn meta(&self, now: Instant) -> ConnectionMeta {
        let next_retry_in_sec = self
            .next_retry
            .filter(|deadline| *deadline > now)
            .map_or(0, |deadline| {
                let remaining = deadline - now;
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                secs.max(1)
            });

        ConnectionMeta {
            status: self.status,
            last_success_ts: self.last_success.map_or(0, |t| t.timestamp()),
            consecutive_failures: self.consecutive_failures,
            next_retry_in_sec,
            error_code: self.last_error.as_ref().map(|e| e.code),
            error_message: self
                .last_error
                .as_ref()
                .map(|e| e.message.clone())
                .unwrap_or_default(),
            active_target: self.active.host().to_string(),
            active_port: self.active.port(),
        }
    }
}

/// Connection metadata pushed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMeta {
    /// Current status
    pub status: ConnectionStatus,
    /// Unix seconds of the last success, 0 if never
    pub last_success_ts: i64,
    /// Consecutive failed attempts
    pub consecutive_failures: u32,
    /// Seconds until the next automatic attempt, 0 if none is pending
    pub next_retry_in_sec: u64,
    /// Category of the last failure, serialized as `""` when none
    #[serde(with = "error_code_or_empty")]
    pub error_code: Option<ErrorCode>,
    /// Message of the last failure, empty when none
    pub error_message: String,
    /// Active host, empty when idle
    pub active_target: String,
    /// Active port, 0 for default
    pub active_port: u16,
}

impl Default for ConnectionMeta {
    fn default() -> Self {
        ConnectionState::idle().meta(Instant::now())
    }
}

mod error_code_or_empty {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::classify::ErrorCode;

    pub fn serialize<S: Serializer>(code: &Option<ErrorCode>, s: S) -> Result<S::Ok, S::Error> {
        match code {
            Some(code) => code.serialize(s),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ErrorCode>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw.is_empty() {
            return Ok(None);
        }
        serde_json::from_value(serde_json::Value::String(raw))
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
