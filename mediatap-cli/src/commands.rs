//! CLI command implementations

use clap::Subcommand;
use mediatap_core::MediatapConfig;
use mediatap_core::config::ExtractorMode;
use mediatap_core::extractor::extractor_from_config;
use mediatap_core::metadata::{metadata_response, playlist_response, rendition_listings};
use mediatap_core::reference::{MediaReference, PlaylistReference};
use mediatap_web::run_server;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        listen: Option<String>,
        /// Extraction backend: subprocess or remote
        #[arg(long)]
        mode: Option<ExtractorMode>,
        /// Path to the extractor binary (subprocess mode)
        #[arg(long)]
        extractor_path: Option<String>,
    },
    /// Resolve one media URL and print its metadata as JSON
    Inspect {
        /// Media URL to resolve
        url: String,
        /// Treat the URL as a playlist
        #[arg(long)]
        playlist: bool,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve {
            listen,
            mode,
            extractor_path,
        } => serve(listen, mode, extractor_path).await,
        Commands::Inspect { url, playlist } => inspect(url, playlist).await,
    }
}

/// Start the HTTP API server with environment configuration plus any
/// command-line overrides.
async fn serve(
    listen: Option<String>,
    mode: Option<ExtractorMode>,
    extractor_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MediatapConfig::from_env();

    if let Some(addr) = listen {
        config.server.listen_addr = addr;
    }
    if let Some(mode) = mode {
        config.extractor.mode = mode;
    }
    if let Some(path) = extractor_path {
        config.extractor.binary_path = path;
    }

    run_server(config).await
}

/// Resolve one URL through the configured backend and print the result.
async fn inspect(url: String, playlist: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = MediatapConfig::from_env();
    let extractor = extractor_from_config(&config.extractor);

    if playlist {
        let reference = PlaylistReference::parse(&url)?;
        let catalog = extractor.playlist(&reference).await?;
        let response = playlist_response(&catalog, config.playlist.max_members);
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        let reference = MediaReference::parse(&url)?;
        let catalog = extractor.catalog(&reference).await?;
        let body = serde_json::json!({
            "metadata": metadata_response(&catalog),
            "renditions": rendition_listings(&catalog),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    }

    Ok(())
}
