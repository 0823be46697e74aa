//! External interface consumed by a presentation layer
//!
//! [`GpuBarService`] bundles the supervisor handle and the alias resolver
//! behind the four calls a front end needs. Events flow back through the
//! receiver returned by [`GpuBarService::start`].

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::monitoring::RemoteMetricsClient;
use crate::settings::AppSettings;
use crate::ssh_config::{AliasCandidate, SshConfigResolver};
use crate::supervisor::{ConnectionSupervisor, GpuEvent, SupervisorConfig};
use crate::testing::ConnectionTestResult;

/// Front-end facing service
#[derive(Debug, Clone)]
pub struct GpuBarService {
    supervisor: ConnectionSupervisor,
    resolver: SshConfigResolver,
}

impl GpuBarService {
    /// Starts a supervisor configured from `settings`
    #[must_use]
    pub fn start(settings: &AppSettings) -> (Self, mpsc::Receiver<GpuEvent>) {
        let client = RemoteMetricsClient::new(Arc::new(settings.monitoring.command_runner()));
        Self::start_with(
            settings.supervisor_config(),
            client,
            settings.ssh_config.resolver(),
        )
    }

    /// Starts a supervisor from explicit parts
    #[must_use]
    pub fn start_with(
        config: SupervisorConfig,
        client: RemoteMetricsClient,
        resolver: SshConfigResolver,
    ) -> (Self, mpsc::Receiver<GpuEvent>) {
        let (supervisor, events) = ConnectionSupervisor::start(config, client);
        (
            Self {
                supervisor,
                resolver,
            },
            events,
        )
    }

    /// Supervisor handle, for binding a presenter
    #[must_use]
    pub const fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// Selects the target; an empty target idles the session and a port
    /// of 0 or less means the default port
    pub fn set_connection(&self, target: &str, port: i64) {
        self.supervisor.set_target(target, port);
    }

    /// Probes a target without changing the session
    pub async fn test_connection(&self, target: &str, port: i64) -> ConnectionTestResult {
        self.supervisor.test_target(target, port).await
    }

    /// Aliases from the client configuration; empty on any failure
    #[must_use]
    pub fn list_ssh_config_connections(&self) -> Vec<AliasCandidate> {
        self.resolver.discover()
    }

    /// Forces an immediate attempt
    pub fn retry_connection(&self) {
        self.supervisor.retry_now();
    }

    /// Stops the poll worker
    pub fn shutdown(&self) {
        self.supervisor.shutdown();
    }
}
