//! `GpuBar` Core Library
//!
//! Remote GPU monitoring over the user's own `ssh` client: a supervisor that
//! polls one target with backoff, a metrics client that runs and parses
//! `nvidia-smi`, and a resolver that lists host aliases from
//! `~/.ssh/config`.
//!
//! # Crate Structure
//!
//! - [`monitoring`] - Remote query, CSV parsing, `ssh` transport
//! - [`supervisor`] - Session state machine and background poll worker
//! - [`classify`] - Failure text to stable error codes
//! - [`ssh_config`] - Host alias discovery with `Include` support
//! - [`presenter`] - Tray capability surface and title formatting
//! - [`service`] - Facade for presentation layers
//! - [`settings`] - TOML settings
//! - [`tracing`] - Logging setup

#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod monitoring;
pub mod presenter;
pub mod service;
pub mod settings;
pub mod ssh_config;
pub mod supervisor;
pub mod target;
pub mod testing;
pub mod tracing;

pub use classify::{Classified, ErrorCode, classify};
pub use error::{GpuBarError, Result, SettingsError, SshConfigError};
pub use monitoring::{
    CommandRunner, GpuRecord, GpuSnapshot, MonitoringError, MonitoringResult, RemoteMetricsClient,
    SshCommandRunner,
};
pub use presenter::{DisplayMode, StatusIcon, TrayAction, TrayBinding, TrayPresenter, format_tray_title};
pub use service::GpuBarService;
pub use settings::{AppSettings, SettingsManager};
pub use ssh_config::{AliasCandidate, SshConfigResolver};
pub use supervisor::{
    ConnectionMeta, ConnectionStatus, ConnectionSupervisor, GpuEvent, RetryPolicy, SupervisorConfig,
};
pub use target::Target;
pub use testing::{ConnectionTestResult, ConnectionTester};
pub use tracing::{TracingConfig, TracingError, TracingLevel, TracingOutput, init_tracing};
