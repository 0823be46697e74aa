//! GPU metrics client
//!
//! Issues one `nvidia-smi` query per call through a [`CommandRunner`]. When
//! the host's driver stack rejects the `cuda_version` field, the query is
//! retried exactly once with the reduced field set. Longer-horizon retry
//! lives in the supervisor.

use std::sync::Arc;

use super::gpu::GpuSnapshot;
use super::parser::{CUDA_FIELD, FieldSet, GpuParser, MonitoringError, MonitoringResult};
use super::ssh_exec::{CommandRunner, SshCommandRunner};
use crate::target::Target;

/// Queries GPU telemetry from one remote host at a time
#[derive(Clone)]
pub struct RemoteMetricsClient {
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for RemoteMetricsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMetricsClient").finish_non_exhaustive()
    }
}

impl Default for RemoteMetricsClient {
    fn default() -> Self {
        Self::new(Arc::new(SshCommandRunner::new()))
    }
}

impl RemoteMetricsClient {
    /// Creates a client over the given transport
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Queries all GPUs on `target`.
    ///
    /// # Errors
    ///
    /// Returns the transport error, the fallback's error if the reduced
    /// query also fails, or a parse error for malformed output.
    pub async fn query(&self, target: &Target) -> MonitoringResult<GpuSnapshot> {
        if target.is_empty() {
            return Err(MonitoringError::EmptyTarget);
        }

        let fields = match self.runner.run(target, FieldSet::Extended.command()).await {
            Ok(output) => return GpuParser::parse(&output, FieldSet::Extended),
            Err(err) if mentions_cuda_field(&err) => {
                tracing::info!(
                    host = %target,
                    error = %err,
                    "Host rejected cuda_version, retrying with reduced field set"
                );
                FieldSet::Reduced
            }
            Err(err) => return Err(err),
        };

        let output = self.runner.run(target, fields.command()).await?;
        GpuParser::parse(&output, fields)
    }
}

fn mentions_cuda_field(err: &MonitoringError) -> bool {
    err.to_string().to_lowercase().contains(CUDA_FIELD)
}
