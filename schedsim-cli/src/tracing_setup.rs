//! Tracing setup for the schedsim CLI
//!
//! Console logs go to stderr at a user-chosen level so stdout only carries
//! simulation output. With a log directory, the full trace of the run is also
//! written to disk.

use std::fs::{File, create_dir_all};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initialize tracing with console output and an optional trace-level file.
///
/// # File Output
/// Writes every event at TRACE level to `<logs_dir>/schedsim-last-run.log`,
/// overwriting the previous run.
///
/// # Errors
/// - If the logs directory cannot be created or the log file cannot be opened
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> anyhow::Result<()> {
    // RUST_LOG wins over the flag when set
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, log_file_path) = match logs_dir {
        Some(dir) => {
            create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join("schedsim-last-run.log");
            let log_file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;

            let layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_filter(EnvFilter::new("trace"));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    match log_file_path {
        Some(path) => tracing::debug!(
            "Tracing initialized: console={}, trace_file={}",
            console_level,
            path.display()
        ),
        None => tracing::debug!("Tracing initialized: console={}", console_level),
    }

    Ok(())
}

/// CLI log levels for user control
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Only error messages
    Error,
    /// Warning and error messages
    Warn,
    /// Informational, warning, and error messages
    Info,
    /// Every recorded scheduler event
    Debug,
    /// All messages including per-resource tracing
    Trace,
}

impl CliLogLevel {
    /// Converts CLI log level to tracing Level enum.
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliLogLevel::Error => write!(f, "error"),
            CliLogLevel::Warn => write!(f, "warn"),
            CliLogLevel::Info => write!(f, "info"),
            CliLogLevel::Debug => write!(f, "debug"),
            CliLogLevel::Trace => write!(f, "trace"),
        }
    }
}
