//! Presentation capability surface
//!
//! Any front end (native status item, terminal, test double) implements
//! [`TrayPresenter`]. A [`TrayBinding`] is constructed with the supervisor
//! handle it drives, turns [`GpuEvent`]s into title and icon updates, and
//! routes user actions back to the supervisor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::monitoring::{GpuRecord, GpuSnapshot};
use crate::supervisor::{ConnectionMeta, ConnectionStatus, ConnectionSupervisor, GpuEvent};

/// Title shown while no target is selected
pub const IDLE_TITLE: &str = "NVSmiBar";
/// Title shown while waiting for the first result
pub const CONNECTING_TITLE: &str = "NV ···";
/// Title shown in the error state
pub const ERROR_TITLE: &str = "NV ⚠";

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// What the tray title shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Temperature only
    Minimal,
    /// Temperature and utilization
    Compact,
    /// Temperature, utilization and VRAM used
    #[default]
    Standard,
    /// Spark bars for utilization, memory and power, plus temperature
    Spark,
    /// Temperature and utilization of every GPU
    Multi,
    /// Temperature, utilization and VRAM used/total
    Graphic,
}

impl DisplayMode {
    /// All modes in menu order
    pub const ALL: [Self; 6] = [
        Self::Graphic,
        Self::Minimal,
        Self::Compact,
        Self::Standard,
        Self::Spark,
        Self::Multi,
    ];

    /// Lowercase name used in settings and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Spark => "spark",
            Self::Multi => "multi",
            Self::Graphic => "graphic",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown display mode '{s}'"))
    }
}

/// Status image for the tray item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusIcon {
    /// Nothing selected
    Idle,
    /// Attempt in flight
    Connecting,
    /// Fresh data
    Live,
    /// Showing old data
    Stale,
    /// Failing
    Error,
}

impl From<ConnectionStatus> for StatusIcon {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Idle => Self::Idle,
            ConnectionStatus::Connecting => Self::Connecting,
            ConnectionStatus::Live => Self::Live,
            ConnectionStatus::Stale => Self::Stale,
            ConnectionStatus::Error => Self::Error,
        }
    }
}

/// Narrow surface a presentation layer implements
pub trait TrayPresenter: Send {
    /// Replaces the status item's title
    fn set_title(&mut self, title: &str);
    /// Replaces the status image
    fn set_status_icon(&mut self, icon: StatusIcon);
    /// Shows the detail window
    fn show(&mut self);
    /// Hides the detail window
    fn hide(&mut self);
}

/// User input coming from the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// The status item was clicked
    Clicked,
    /// The user asked for an immediate retry
    Retry,
}

/// Formats VRAM in GiB with one decimal, `--` when unknown
fn vram_gib(mib: i64) -> String {
    if mib < 0 {
        return "--".to_string();
    }
    let gib = mib as f64 / 1024.0;
    format!("{gib:.1}")
}

fn spark(value: i64) -> char {
    let v = value.clamp(0, 100);
    // floor(v / 100 * 8), capped at the last glyph
    let idx = usize::try_from(v * 8 / 100).unwrap_or(0).min(SPARK_CHARS.len() - 1);
    SPARK_CHARS[idx]
}

/// Builds the tray title for the current data and status
#[must_use]
pub fn format_tray_title(gpus: &[GpuRecord], status: ConnectionStatus, mode: DisplayMode) -> String {
    match status {
        ConnectionStatus::Idle => return IDLE_TITLE.to_string(),
        ConnectionStatus::Connecting => return CONNECTING_TITLE.to_string(),
        ConnectionStatus::Error => return ERROR_TITLE.to_string(),
        ConnectionStatus::Live | ConnectionStatus::Stale => {}
    }
    let Some(g) = gpus.first() else {
        return CONNECTING_TITLE.to_string();
    };

    let value = match mode {
        DisplayMode::Minimal => format!("{}°", g.temperature),
        DisplayMode::Compact => format!("{}° · {}%", g.temperature, g.utilization),
        DisplayMode::Standard => format!(
            "{}° · {}% · {}G",
            g.temperature,
            g.utilization,
            vram_gib(g.mem_used)
        ),
        DisplayMode::Spark => format!(
            "{}{}{} {}°",
            spark(g.utilization),
            spark(g.memory_percent()),
            spark(g.power_percent()),
            g.temperature
        ),
        DisplayMode::Multi => gpus
            .iter()
            .map(|gpu| format!("G{}:{}°·{}%", gpu.index, gpu.temperature, gpu.utilization))
            .collect::<Vec<_>>()
            .join(" │ "),
        DisplayMode::Graphic => format!(
            "{}° · {}% | {}/{}G",
            g.temperature,
            g.utilization,
            vram_gib(g.mem_used),
            vram_gib(g.mem_total)
        ),
    };

    if status == ConnectionStatus::Stale {
        format!("{value} !")
    } else {
        value
    }
}

/// Adapter between a supervisor and a presenter.
///
/// Holds the supervisor it was built with; there is no process-wide
/// instance.
pub struct TrayBinding<P: TrayPresenter> {
    supervisor: ConnectionSupervisor,
    presenter: P,
    mode: DisplayMode,
    gpus: GpuSnapshot,
    meta: ConnectionMeta,
    last_error: Option<String>,
    title: Option<String>,
    icon: Option<StatusIcon>,
    visible: bool,
}

impl<P: TrayPresenter> TrayBinding<P> {
    /// Binds `presenter` to `supervisor` and paints the idle title
    pub fn new(supervisor: ConnectionSupervisor, presenter: P, mode: DisplayMode) -> Self {
        let mut binding = Self {
            supervisor,
            presenter,
            mode,
            gpus: GpuSnapshot::default(),
            meta: ConnectionMeta::default(),
            last_error: None,
            title: None,
            icon: None,
            visible: false,
        };
        binding.repaint();
        binding
    }

    /// Bound presenter
    pub const fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Latest snapshot for the active target
    pub const fn snapshot(&self) -> &GpuSnapshot {
        &self.gpus
    }

    /// Latest connection metadata
    pub const fn meta(&self) -> &ConnectionMeta {
        &self.meta
    }

    /// Latest error message, cleared by the next snapshot
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Switches the title format
    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        self.repaint();
    }

    /// Applies one supervisor event
    pub fn handle_event(&mut self, event: GpuEvent) {
        match event {
            GpuEvent::Snapshot(snapshot) => {
                self.gpus = snapshot;
                self.last_error = None;
            }
            GpuEvent::Error(message) => self.last_error = Some(message),
            GpuEvent::Meta(meta) => {
                if meta.active_target != self.meta.active_target
                    || meta.active_port != self.meta.active_port
                {
                    self.gpus = GpuSnapshot::default();
                    self.last_error = None;
                }
                self.meta = meta;
            }
        }
        self.repaint();
    }

    /// Applies one user action
    pub fn handle_action(&mut self, action: TrayAction) {
        match action {
            TrayAction::Clicked => {
                self.visible = !self.visible;
                if self.visible {
                    self.presenter.show();
                } else {
                    self.presenter.hide();
                }
            }
            TrayAction::Retry => {
                tracing::debug!("Retry requested from tray");
                self.supervisor.retry_now();
            }
        }
    }

    /// Pumps events and actions until the event channel closes, then
    /// returns the presenter
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<GpuEvent>,
        mut actions: mpsc::Receiver<TrayAction>,
    ) -> P {
        let mut actions_open = true;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                action = actions.recv(), if actions_open => match action {
                    Some(action) => self.handle_action(action),
                    None => actions_open = false,
                },
            }
        }
        self.presenter
    }

    fn repaint(&mut self) {
        let title = format_tray_title(self.gpus.gpus(), self.meta.status, self.mode);
        if self.title.as_deref() != Some(title.as_str()) {
            self.presenter.set_title(&title);
            self.title = Some(title);
        }
        let icon = StatusIcon::from(self.meta.status);
        if self.icon != Some(icon) {
            self.presenter.set_status_icon(icon);
            self.icon = Some(icon);
        }
    }
}
