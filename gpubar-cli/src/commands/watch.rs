//! Watch command: runs the supervisor against one host until Ctrl-C.

use chrono::Local;
use gpubar_core::{
    AppSettings, ConnectionMeta, ConnectionStatus, DisplayMode, GpuBarService, GpuEvent,
    StatusIcon, TrayBinding, TrayPresenter,
};
use tokio::sync::mpsc;

use crate::error::CliError;
use crate::util::runtime;

/// Prints title changes as timestamped lines
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    icon: Option<StatusIcon>,
    lines: usize,
}

impl TerminalPresenter {
    /// Number of title lines printed so far
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }
}

impl TrayPresenter for TerminalPresenter {
    fn set_title(&mut self, title: &str) {
        let marker = match self.icon {
            Some(StatusIcon::Live) => "\x1b[32m●\x1b[0m",
            Some(StatusIcon::Stale) => "\x1b[33m●\x1b[0m",
            Some(StatusIcon::Error) => "\x1b[31m●\x1b[0m",
            Some(StatusIcon::Connecting) => "\x1b[36m○\x1b[0m",
            Some(StatusIcon::Idle) | None => "○",
        };
        println!("{} {marker} {title}", Local::now().format("%H:%M:%S"));
        self.lines += 1;
    }

    fn set_status_icon(&mut self, icon: StatusIcon) {
        self.icon = Some(icon);
    }

    fn show(&mut self) {}

    fn hide(&mut self) {}
}

/// Polls a host until interrupted
pub fn cmd_watch(
    settings: &AppSettings,
    target: Option<&str>,
    port: i64,
    mode: Option<DisplayMode>,
    json: bool,
) -> Result<(), CliError> {
    let runtime = runtime()?;
    runtime.block_on(async {
        let (service, events) = GpuBarService::start(settings);
        let (host, port) = match target {
            Some(host) if !host.trim().is_empty() => (host.to_string(), port),
            _ => default_target(&service)?,
        };
        tracing::info!(%host, port, "Watching");
        service.set_connection(&host, port);

        let mode = mode.unwrap_or(settings.display.mode);
        let outcome = if json {
            pump_json(events).await
        } else {
            pump_titles(&service, events, mode).await;
            Ok(())
        };
        service.shutdown();
        outcome
    })
}

/// First alias from the ssh client configuration
fn default_target(service: &GpuBarService) -> Result<(String, i64), CliError> {
    service
        .list_ssh_config_connections()
        .into_iter()
        .next()
        .map(|alias| (alias.target, i64::from(alias.port)))
        .ok_or_else(|| {
            CliError::Config("No target given and no host aliases found in ssh config".to_string())
        })
}

async fn pump_json(mut events: mpsc::Receiver<GpuEvent>) -> Result<(), CliError> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            event = events.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => return Ok(()),
            },
        }
    }
}

async fn pump_titles(
    service: &GpuBarService,
    mut events: mpsc::Receiver<GpuEvent>,
    mode: DisplayMode,
) {
    let mut binding = TrayBinding::new(service.supervisor().clone(), TerminalPresenter::default(), mode);
    let mut reported = 0;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => {
                    if let GpuEvent::Meta(meta) = &event
                        && let Some(line) = failure_line(meta, reported)
                    {
                        eprintln!("{line}");
                        reported = meta.consecutive_failures;
                    }
                    binding.handle_event(event);
                }
                None => break,
            },
        }
    }
    tracing::debug!(lines = binding.presenter().lines(), "Watch finished");
}

/// Detail line for a new failure, `None` when already reported
fn failure_line(meta: &ConnectionMeta, reported: u32) -> Option<String> {
    if meta.consecutive_failures == 0 || meta.consecutive_failures == reported {
        return None;
    }
    match meta.status {
        ConnectionStatus::Stale | ConnectionStatus::Error => Some(format!(
            "  {} [{}] {} (attempt {}, retry in {}s)",
            meta.status.as_str(),
            meta.error_code.map_or("", |c| c.as_str()),
            meta.error_message,
            meta.consecutive_failures,
            meta.next_retry_in_sec,
        )),
        _ => None,
    }
}
