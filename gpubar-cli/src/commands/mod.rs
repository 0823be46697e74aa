//! Command implementations and dispatch.

mod hosts;
mod watch;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::load_settings;

pub use hosts::cmd_hosts;
pub use test::cmd_test;
pub use watch::cmd_watch;

/// Dispatches a parsed command to its handler
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    let settings = load_settings(config_path)?;
    match command {
        Commands::Watch {
            target,
            port,
            mode,
            json,
        } => cmd_watch(&settings, target.as_deref(), port, mode, json),
        Commands::Test { target, port, json } => cmd_test(&settings, &target, port, json),
        Commands::Hosts { format } => cmd_hosts(&settings, format),
    }
}
