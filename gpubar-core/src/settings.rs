//! Persisted application settings
//!
//! Stored as `config.toml` in `$GPUBAR_CONFIG_DIR`, or `gpubar/` under the
//! platform configuration directory. Every field has a default, so partial
//! files are fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};
use crate::monitoring::SshCommandRunner;
use crate::monitoring::ssh_exec::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS};
use crate::presenter::DisplayMode;
use crate::ssh_config::SshConfigResolver;
use crate::supervisor::{DEFAULT_BACKOFF_SECS, DEFAULT_ERROR_THRESHOLD, RetryPolicy, SupervisorConfig};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "GPUBAR_CONFIG_DIR";

/// Settings file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

const MIN_SECS: u64 = 1;
const MAX_SECS: u64 = 60;

/// Polling and transport settings (`[monitoring]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Poll period in seconds (1–60, default: 1)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// `ssh` connect timeout in seconds (1–60, default: 3)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound on one remote process in seconds (default: 15)
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// `ssh` executable
    #[serde(default = "default_ssh_binary")]
    pub ssh_binary: String,
}

const fn default_poll_interval_secs() -> u64 {
    1
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

const fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_ssh_binary() -> String {
    "ssh".to_string()
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            ssh_binary: default_ssh_binary(),
        }
    }
}

impl MonitoringSettings {
    /// Poll interval clamped to 1–60 seconds
    #[must_use]
    pub const fn effective_poll_interval(&self) -> Duration {
        Duration::from_secs(clamp_secs(self.poll_interval_secs))
    }

    /// Connect timeout clamped to 1–60 seconds
    #[must_use]
    pub const fn effective_connect_timeout_secs(&self) -> u64 {
        clamp_secs(self.connect_timeout_secs)
    }

    /// Process timeout, never shorter than the connect timeout
    #[must_use]
    pub fn effective_command_timeout(&self) -> Duration {
        Duration::from_secs(
            self.command_timeout_secs
                .max(self.effective_connect_timeout_secs()),
        )
    }

    /// Builds the `ssh` transport these settings describe
    #[must_use]
    pub fn command_runner(&self) -> SshCommandRunner {
        let program = if self.ssh_binary.trim().is_empty() {
            default_ssh_binary()
        } else {
            self.ssh_binary.trim().to_string()
        };
        SshCommandRunner::new()
            .with_program(program)
            .with_connect_timeout_secs(self.effective_connect_timeout_secs())
            .with_command_timeout(self.effective_command_timeout())
    }
}

const fn clamp_secs(secs: u64) -> u64 {
    if secs < MIN_SECS {
        MIN_SECS
    } else if secs > MAX_SECS {
        MAX_SECS
    } else {
        secs
    }
}

/// Backoff settings (`[retry]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Delay after the Nth consecutive failure, last entry repeats
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,
    /// Consecutive failures after which a stale session turns to error
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,
}

fn default_backoff_secs() -> Vec<u64> {
    DEFAULT_BACKOFF_SECS.to_vec()
}

const fn default_error_threshold() -> u32 {
    DEFAULT_ERROR_THRESHOLD
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            backoff_secs: default_backoff_secs(),
            error_threshold: default_error_threshold(),
        }
    }
}

impl RetrySettings {
    /// Converts to a policy; an empty table means the default table
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .with_backoff_secs(&self.backoff_secs)
            .with_error_threshold(self.error_threshold)
    }
}

/// Tray title settings (`[display]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Title format
    #[serde(default)]
    pub mode: DisplayMode,
}

/// Alias discovery settings (`[ssh_config]`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshConfigSettings {
    /// Root client configuration file instead of `~/.ssh/config`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl SshConfigSettings {
    /// Resolver honoring the override
    #[must_use]
    pub fn resolver(&self) -> SshConfigResolver {
        let resolver = SshConfigResolver::new();
        match &self.path {
            Some(path) => {
                let home = dirs::home_dir();
                resolver.with_root(expand_tilde(path, home.as_deref()))
            }
            None => resolver,
        }
    }
}

/// Expands a leading `~` against `home`; other paths pass through
fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::tilde_with_context(&raw, || home.and_then(Path::to_str));
    PathBuf::from(expanded.as_ref())
}

/// All persisted settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Polling and transport
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Backoff policy
    #[serde(default)]
    pub retry: RetrySettings,
    /// Tray title
    #[serde(default)]
    pub display: DisplaySettings,
    /// Alias discovery
    #[serde(default)]
    pub ssh_config: SshConfigSettings,
}

impl AppSettings {
    /// Supervisor configuration derived from these settings
    #[must_use]
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig::default()
            .with_poll_interval(self.monitoring.effective_poll_interval())
            .with_policy(self.retry.policy())
    }
}

/// Loads and saves [`AppSettings`]
#[derive(Debug, Clone)]
pub struct SettingsManager {
    config_dir: PathBuf,
}

impl SettingsManager {
    /// Manager for the default configuration directory
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoConfigDir`] if neither
    /// `$GPUBAR_CONFIG_DIR` nor a platform directory is available.
    pub fn new() -> SettingsResult<Self> {
        let config_dir = std::env::var_os(CONFIG_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("gpubar")))
            .ok_or(SettingsError::NoConfigDir)?;
        Ok(Self { config_dir })
    }

    /// Manager for an explicit directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads settings; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> SettingsResult<AppSettings> {
        Self::load_from(&self.settings_path())
    }

    /// Loads settings from an explicit file; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> SettingsResult<AppSettings> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(AppSettings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes settings, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, settings: &AppSettings) -> SettingsResult<()> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SettingsError::Io { path, source }
        };
        fs::create_dir_all(&self.config_dir).map_err(io_err(&self.config_dir))?;

        let content =
            toml::to_string_pretty(settings).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        let path = self.settings_path();
        fs::write(&path, content).map_err(io_err(&path))?;
        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}
