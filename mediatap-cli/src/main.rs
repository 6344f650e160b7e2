//! Mediatap CLI - Command-line interface
//!
//! Starts the HTTP server or resolves a single media reference from the
//! terminal.

mod commands;

use std::path::Path;

use clap::Parser;
use mediatap_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "mediatap")]
#[command(about = "A media resolution and download proxy server")]
struct Cli {
    /// Console log level
    #[arg(long, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The server keeps a debug log on disk; one-shot lookups log to the
    // console only.
    let logs_dir = match &cli.command {
        commands::Commands::Serve { .. } => Some(Path::new("logs")),
        commands::Commands::Inspect { .. } => None,
    };
    init_tracing(cli.log_level.as_tracing_level(), logs_dir)?;

    commands::handle_command(cli.command).await?;

    Ok(())
}
