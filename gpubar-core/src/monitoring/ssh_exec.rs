//! Remote command execution over `ssh`
//!
//! Runs each query in a separate, non-interactive `ssh` process. Credentials
//! come from the user's own SSH setup (agent, keys, `~/.ssh/config`); batch
//! mode makes a missing credential fail fast instead of prompting.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::parser::{MonitoringError, MonitoringResult};
use crate::target::Target;

/// Default `ConnectTimeout` passed to `ssh` (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Default upper bound on one remote process (seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 15;

/// Transport that runs a shell command on a target and returns its stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` on `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`MonitoringError`] whose text carries the transport or
    /// remote-command diagnostics.
    async fn run(&self, target: &Target, command: &str) -> MonitoringResult<String>;
}

/// [`CommandRunner`] backed by the system `ssh` client
#[derive(Debug, Clone)]
pub struct SshCommandRunner {
    program: String,
    connect_timeout_secs: u64,
    command_timeout: Duration,
}

impl Default for SshCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SshCommandRunner {
    /// Creates a runner with the default `ssh` binary and timeouts
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "ssh".to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
        }
    }

    /// Uses a different `ssh` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the `ConnectTimeout` option (seconds)
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Sets the overall process timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Builds the `ssh` argument list for one invocation
    #[must_use]
    pub fn build_args(&self, target: &Target, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];
        if let Some(port) = target.explicit_port() {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.push(target.host().to_string());
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl CommandRunner for SshCommandRunner {
    async fn run(&self, target: &Target, command: &str) -> MonitoringResult<String> {
        if target.is_empty() {
            return Err(MonitoringError::EmptyTarget);
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(self.build_args(target, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::trace!(target_host = %target, command, "Running remote command");

        let output = match tokio::time::timeout(self.command_timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(MonitoringError::Spawn(e.to_string())),
            Err(_) => return Err(MonitoringError::Timeout(self.command_timeout.as_secs())),
        };

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        // nvidia-smi reports unknown fields on stdout, ssh on stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let combined = [stderr.trim(), stdout.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        let message = if combined.is_empty() {
            output.status.to_string()
        } else {
            combined
        };
        Err(MonitoringError::Command(message))
    }
}

/// Replays canned responses and records the commands it was given
#[cfg(test)]
pub(crate) struct ScriptedRunner {
    responses: std::sync::Mutex<std::collections::VecDeque<MonitoringResult<String>>>,
    commands: std::sync::Mutex<Vec<String>>,
    hook: Option<Box<dyn Fn() + Send + Sync>>,
}

#[cfg(test)]
impl ScriptedRunner {
    pub(crate) fn new(responses: Vec<MonitoringResult<String>>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::build(responses, None))
    }

    /// Runs `hook` at the start of every command, before responding
    pub(crate) fn with_hook(
        responses: Vec<MonitoringResult<String>>,
        hook: impl Fn() + Send + Sync + 'static,
    ) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::build(responses, Some(Box::new(hook))))
    }

    fn build(
        responses: Vec<MonitoringResult<String>>,
        hook: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            commands: std::sync::Mutex::new(Vec::new()),
            hook,
        }
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, _target: &Target, command: &str) -> MonitoringResult<String> {
        if let Some(hook) = &self.hook {
            hook();
        }
        self.commands.lock().unwrap().push(command.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MonitoringError::Command("no scripted response".into())))
    }
}
