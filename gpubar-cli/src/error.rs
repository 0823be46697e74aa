//! CLI error types and exit codes.

use gpubar_core::GpuBarError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, runtime, or output errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the host did not answer a GPU query
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection test failed
    #[error("Connection test failed: {0}")]
    TestFailed(String),

    /// Async runtime could not be set up
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Output could not be produced
    #[error("Output error: {0}")]
    Output(String),
}

impl From<GpuBarError> for CliError {
    fn from(err: GpuBarError) -> Self {
        match err {
            GpuBarError::Monitoring(e) => Self::TestFailed(e.to_string()),
            GpuBarError::SshConfig(e) => Self::Config(e.to_string()),
            GpuBarError::Settings(e) => Self::Config(e.to_string()),
            GpuBarError::Tracing(e) => Self::Runtime(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error
    /// - 2: Connection failure
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TestFailed(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::Runtime(_) | Self::Output(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
