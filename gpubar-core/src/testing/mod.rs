//! Connection testing for preflight validation.
//!
//! A test runs one GPU query against a candidate target without touching the
//! supervisor's session, so callers can validate a target before committing
//! to it.

use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::monitoring::RemoteMetricsClient;
use crate::target::Target;

/// Result of testing a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    /// Whether the query succeeded
    pub success: bool,
    /// Error code on failure, empty on success
    pub code: String,
    /// Human-readable outcome
    pub message: String,
    /// Number of GPUs found, 0 on failure
    pub gpu_count: usize,
}

impl ConnectionTestResult {
    /// Creates a successful test result
    #[must_use]
    pub fn success(gpu_count: usize) -> Self {
        let plural = if gpu_count == 1 { "" } else { "s" };
        Self {
            success: true,
            code: String::new(),
            message: format!("Connected. Found {gpu_count} GPU{plural}."),
            gpu_count,
        }
    }

    /// Creates a failed test result from raw failure text
    #[must_use]
    pub fn failure(raw_error: &str) -> Self {
        let classified = classify(raw_error);
        Self {
            success: false,
            code: classified.code.as_str().to_string(),
            message: classified.message,
            gpu_count: 0,
        }
    }

    /// Returns true if the test failed
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !self.success
    }
}

/// Runs one-shot connection tests
#[derive(Debug, Clone, Default)]
pub struct ConnectionTester {
    client: RemoteMetricsClient,
}

impl ConnectionTester {
    /// Creates a tester that queries through `client`
    #[must_use]
    pub const fn new(client: RemoteMetricsClient) -> Self {
        Self { client }
    }

    /// Tests `host`/`port`; a blank host fails without running anything.
    pub async fn test_target(&self, host: &str, port: i64) -> ConnectionTestResult {
        let target = Target::new(host, port);
        let result = match self.client.query(&target).await {
            Ok(snapshot) => ConnectionTestResult::success(snapshot.len()),
            Err(err) => ConnectionTestResult::failure(&err.to_string()),
        };
        tracing::debug!(
            host = %target,
            success = result.success,
            code = %result.code,
            gpus = result.gpu_count,
            "Connection test finished"
        );
        result
    }
}
