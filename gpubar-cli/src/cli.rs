//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gpubar_core::DisplayMode;

/// `gpubar` command-line interface for monitoring a remote GPU host
#[derive(Parser)]
#[command(name = "gpubar")]
#[command(author, version, about = "Remote GPU monitor over ssh")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "GPUBAR_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Poll a host until interrupted
    #[command(about = "Poll a host and print its GPU title until Ctrl-C")]
    Watch {
        /// Host or ssh alias (defaults to the first alias in ~/.ssh/config)
        target: Option<String>,

        /// Port (0 or omitted uses the ssh default)
        #[arg(short, long, default_value_t = 0)]
        port: i64,

        /// Title format (minimal, compact, standard, spark, multi, graphic)
        #[arg(short, long)]
        mode: Option<DisplayMode>,

        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Run one query against a host
    #[command(about = "Test whether a host answers a GPU query")]
    Test {
        /// Host or ssh alias
        target: String,

        /// Port (0 or omitted uses the ssh default)
        #[arg(short, long, default_value_t = 0)]
        port: i64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List host aliases from the ssh client configuration
    #[command(about = "List host aliases found in ~/.ssh/config")]
    Hosts {
        /// Output format for the alias list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}
