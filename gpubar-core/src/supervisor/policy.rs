//! Retry policy for the connection supervisor
//!
//! The backoff table is indexed by the consecutive failure count and capped
//! at its last entry. After [`DEFAULT_ERROR_THRESHOLD`] consecutive failures
//! a previously healthy session is reported as `error` instead of `stale`.

use std::time::Duration;

/// Default backoff table in seconds
pub const DEFAULT_BACKOFF_SECS: [u64; 5] = [2, 5, 10, 20, 30];

/// Default consecutive-failure count at which `stale` becomes `error`
pub const DEFAULT_ERROR_THRESHOLD: u32 = 6;

/// Shortest delay a retry deadline may be scheduled with
pub const MIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Backoff and status-escalation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Vec<Duration>,
    error_threshold: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }
}

impl RetryPolicy {
    /// Creates the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the backoff table.
    ///
    /// Entries shorter than one second are raised to one second. An empty
    /// table keeps the current one.
    #[must_use]
    pub fn with_backoff(mut self, backoff: impl IntoIterator<Item = Duration>) -> Self {
        let table: Vec<Duration> = backoff
            .into_iter()
            .map(|d| d.max(MIN_RETRY_DELAY))
            .collect();
        if !table.is_empty() {
            self.backoff = table;
        }
        self
    }

    /// Replaces the backoff table from whole seconds
    #[must_use]
    pub fn with_backoff_secs(self, secs: &[u64]) -> Self {
        self.with_backoff(secs.iter().map(|s| Duration::from_secs(*s)))
    }

    /// Sets the escalation threshold (at least 1)
    #[must_use]
    pub fn with_error_threshold(mut self, threshold: u32) -> Self {
        self.error_threshold = threshold.max(1);
        self
    }

    /// The backoff table
    #[must_use]
    pub fn backoff(&self) -> &[Duration] {
        &self.backoff
    }

    /// Consecutive failures at which a healthy session escalates to `error`
    #[must_use]
    pub const fn error_threshold(&self) -> u32 {
        self.error_threshold
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    ///
    /// `failures` of 0 or 1 use the first entry; counts beyond the table use
    /// the last entry.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        let idx = (failures.max(1) - 1) as usize;
        self.backoff
            .get(idx)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(MIN_RETRY_DELAY)
    }
}
