//! Centralized configuration for Mediatap.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::time::Duration;

/// Central configuration for all Mediatap components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct MediatapConfig {
    pub extractor: ExtractorConfig,
    pub server: ServerConfig,
    pub playlist: PlaylistConfig,
    pub ledger: LedgerConfig,
}

/// Which extraction backend the server uses.
///
/// Selected once at startup; request handling is identical across modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorMode {
    /// Spawn the external extractor binary and parse its JSON output
    Subprocess,
    /// Resolve catalogs through a remote HTTP metadata service
    Remote,
}

impl Default for ExtractorMode {
    fn default() -> Self {
        Self::Subprocess
    }
}

impl std::str::FromStr for ExtractorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subprocess" | "cli" => Ok(Self::Subprocess),
            "remote" | "api" => Ok(Self::Remote),
            _ => Err(format!(
                "Invalid extractor mode: '{s}'. Valid options are: subprocess, remote"
            )),
        }
    }
}

impl std::fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subprocess => write!(f, "subprocess"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Extraction backend configuration.
///
/// Controls which backend resolves catalogs, where its binary lives,
/// and how long a single resolution call may take.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Backend selection
    pub mode: ExtractorMode,
    /// Path to the extractor binary (subprocess mode)
    pub binary_path: String,
    /// Base URL of the remote metadata service (remote mode)
    pub remote_api_base: String,
    /// Bounded timeout for one extraction call. A hang in the external
    /// tool surfaces as a timeout failure instead of blocking the caller.
    pub extract_timeout: Duration,
    /// User agent passed to the extractor / metadata service
    pub user_agent: &'static str,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Subprocess,
            binary_path: "yt-dlp".to_string(),
            remote_api_base: "http://127.0.0.1:8080".to_string(),
            extract_timeout: Duration::from_secs(30),
            user_agent: "mediatap/0.1.0",
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address for the HTTP API
    pub listen_addr: String,
    /// Maximum accepted JSON request body size in bytes
    pub max_body_bytes: usize,
    /// Shared secret for admin ledger operations (`x-admin-key` header)
    pub admin_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            max_body_bytes: 1_048_576, // 1 MiB
            admin_key: "change-me".to_string(),
        }
    }
}

/// Playlist batch-download configuration.
#[derive(Debug, Clone)]
pub struct PlaylistConfig {
    /// Only the first N playlist members are processed
    pub max_members: usize,
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self { max_members: 10 }
    }
}

/// Payment ledger persistence configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Directory holding one JSON file per payment record
    pub directory: std::path::PathBuf,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            directory: std::path::PathBuf::from("payments"),
        }
    }
}

impl MediatapConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("MEDIATAP_EXTRACTOR_MODE") {
            if let Ok(parsed) = mode.parse() {
                config.extractor.mode = parsed;
            }
        }

        if let Ok(path) = std::env::var("MEDIATAP_EXTRACTOR_PATH") {
            config.extractor.binary_path = path;
        }

        if let Ok(base) = std::env::var("MEDIATAP_REMOTE_API_BASE") {
            config.extractor.remote_api_base = base;
        }

        if let Ok(timeout) = std::env::var("MEDIATAP_EXTRACT_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.extractor.extract_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(addr) = std::env::var("MEDIATAP_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(key) = std::env::var("MEDIATAP_ADMIN_KEY") {
            config.server.admin_key = key;
        }

        if let Ok(members) = std::env::var("MEDIATAP_PLAYLIST_MAX") {
            if let Ok(count) = members.parse::<usize>() {
                config.playlist.max_members = count;
            }
        }

        if let Ok(dir) = std::env::var("MEDIATAP_LEDGER_DIR") {
            config.ledger.directory = std::path::PathBuf::from(dir);
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// Short timeouts and a small playlist cap keep test runs fast.
    pub fn for_testing() -> Self {
        Self {
            extractor: ExtractorConfig {
                extract_timeout: Duration::from_secs(2),
                ..Default::default()
            },
            playlist: PlaylistConfig { max_members: 3 },
            ..Default::default()
        }
    }
}
