//! Error types for `gpubar-core`
//!
//! Each concern has its own `thiserror` enum and `XxxResult` alias;
//! [`GpuBarError`] aggregates them for callers that cross concerns.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::monitoring::{MonitoringError, MonitoringResult};
pub use crate::tracing::TracingError;

/// Errors raised while reading the client configuration.
///
/// These never reach `discover()` callers; the resolver logs and skips the
/// offending file or pattern.
#[derive(Debug, Error)]
pub enum SshConfigError {
    /// A configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An Include pattern could not be compiled
    #[error("invalid include pattern {pattern:?}: {reason}")]
    Pattern {
        /// Raw pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type alias for client configuration parsing
pub type SshConfigResult<T> = std::result::Result<T, SshConfigError>;

/// Errors related to persisted settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No configuration directory could be determined
    #[error("could not determine the configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed
    #[error("failed to access {path}: {source}")]
    Io {
        /// Settings file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`AppSettings`]
    ///
    /// [`AppSettings`]: crate::settings::AppSettings
    #[error("failed to parse {path}: {reason}")]
    Parse {
        /// Settings file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Settings could not be serialized
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
}

/// Result type alias for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Top-level error for `gpubar-core`
#[derive(Debug, Error)]
pub enum GpuBarError {
    /// Remote query failure
    #[error(transparent)]
    Monitoring(#[from] MonitoringError),

    /// Client configuration failure
    #[error(transparent)]
    SshConfig(#[from] SshConfigError),

    /// Settings failure
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Logging setup failure
    #[error(transparent)]
    Tracing(#[from] TracingError),
}

/// Result type alias for `gpubar-core`
pub type Result<T> = std::result::Result<T, GpuBarError>;
