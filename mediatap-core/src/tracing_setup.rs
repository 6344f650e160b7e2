//! Tracing setup for Mediatap.
//!
//! The console layer honors the caller-chosen level (or `RUST_LOG` when
//! set). A debug file sink is added only when a logs directory is given:
//! the server wants a postmortem trail, one-shot CLI lookups do not.

use std::fs::{File, create_dir_all};
use std::io;
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log file name inside the logs directory, overwritten per run.
const LOG_FILE: &str = "mediatap.log";

/// Installs the global subscriber.
///
/// # Errors
///
/// - `io::Error` - If the logs directory cannot be created or the log
///   file cannot be opened
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> io::Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));
    let console = fmt::layer().with_target(true).with_filter(console_filter);

    let registry = tracing_subscriber::registry().with(console);

    match logs_dir {
        Some(dir) => {
            create_dir_all(dir)?;
            let log_path = dir.join(LOG_FILE);
            let file = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(File::create(&log_path)?)
                .with_filter(EnvFilter::new("debug"));
            registry.with(file).init();
            tracing::info!(log_file = %log_path.display(), "Debug log enabled");
        }
        None => registry.init(),
    }

    Ok(())
}

/// Console log levels selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliLogLevel {
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
        // Matches the value names clap derives, so default_value_t round-trips.
        let name = match self {
            CliLogLevel::Error => "error",
            CliLogLevel::Warn => "warn",
            CliLogLevel::Info => "info",
            CliLogLevel::Debug => "debug",
            CliLogLevel::Trace => "trace",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn test_cli_level_maps_to_tracing_level() {
        assert_eq!(CliLogLevel::Error.as_tracing_level(), Level::ERROR);
        assert_eq!(CliLogLevel::Info.as_tracing_level(), Level::INFO);
        assert_eq!(CliLogLevel::Trace.as_tracing_level(), Level::TRACE);
    }

    #[test]
    fn test_display_round_trips_through_clap_values() {
        for level in CliLogLevel::value_variants() {
            let rendered = level.to_string();
            let parsed = CliLogLevel::from_str(&rendered, false).expect("clap value");
            assert_eq!(parsed, *level);
        }
    }
}
