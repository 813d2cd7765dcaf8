//! Schedsim CLI - Command-line interface
//!
//! Runs scheduling simulations over JSON workloads.

mod commands;
mod tracing_setup;

use std::path::PathBuf;

use clap::Parser;

use crate::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "schedsim")]
#[command(about = "A deterministic CPU/IO process scheduling simulator")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn, global = true)]
    log_level: CliLogLevel,
    /// Write a full trace-level log of the run into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: commands::Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.log_dir.as_deref())?;

    commands::handle_command(cli.command)
}
