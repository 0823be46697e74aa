//! `gpubar` - command-line front end for the GPUBar remote GPU monitor
//!
//! Provides commands for watching a host's GPUs over ssh, testing a host
//! once, and listing host aliases from the ssh client configuration.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use gpubar_core::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        TracingLevel::from_verbosity(cli.verbose)
    };
    let tracing_config = TracingConfig::new()
        .with_level(level)
        .with_output(TracingOutput::Stderr);
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Warning: {e}");
    }

    let result = commands::dispatch(config_path, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
