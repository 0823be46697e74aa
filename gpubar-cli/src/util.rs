//! Shared helpers for CLI commands.

use std::path::Path;

use gpubar_core::{AppSettings, SettingsManager};

use crate::error::CliError;

/// Loads settings from `config_dir`, or from the default location when
/// none is given. A missing settings file yields defaults.
pub fn load_settings(config_dir: Option<&Path>) -> Result<AppSettings, CliError> {
    Ok(read_settings(config_dir)?)
}

fn read_settings(config_dir: Option<&Path>) -> gpubar_core::Result<AppSettings> {
    let manager = match config_dir {
        Some(dir) => SettingsManager::with_config_dir(dir),
        None => SettingsManager::new()?,
    };
    Ok(manager.load()?)
}

/// Builds a current-thread runtime for one command
pub fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}

/// Renders a port for display, `default` when unset
pub fn format_port(port: u16) -> String {
    if port == 0 {
        "default".to_string()
    } else {
        port.to_string()
    }
}

/// Truncates a string to a maximum length with ellipsis
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
