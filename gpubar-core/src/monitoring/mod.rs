//! Remote GPU monitoring
//!
//! Agentless GPU telemetry collection: `nvidia-smi` is run on the remote
//! host through the user's `ssh` client and its CSV output is parsed into a
//! [`GpuSnapshot`].
//!
//! This module is GUI-free and stateless across calls; retry and status
//! tracking live in [`crate::supervisor`].

pub mod client;
mod gpu;
mod parser;
pub mod ssh_exec;

pub use client::RemoteMetricsClient;
pub use gpu::{GpuRecord, GpuSnapshot, UNREPORTED};
pub use parser::{
    CUDA_FIELD, FieldSet, GPU_QUERY_COMMAND, GPU_QUERY_COMMAND_NO_CUDA, GpuParser, MIN_FIELDS,
    MonitoringError, MonitoringResult,
};
pub use ssh_exec::{CommandRunner, SshCommandRunner};

#[cfg(test)]
pub(crate) use gpu::sample_record;
