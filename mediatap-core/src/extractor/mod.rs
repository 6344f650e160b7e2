//! Extractor adapters bridging to out-of-process media-information providers.
//!
//! Two backends implement the same [`MediaExtractor`] trait: a subprocess
//! adapter that drives the external extractor binary, and a remote adapter
//! that resolves catalogs through an HTTP metadata service. The backend is
//! chosen once at startup from configuration; request handling never
//! branches on it.

mod remote;
mod ytdlp;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use remote::RemoteApiExtractor;
pub use ytdlp::YtDlpExtractor;

use crate::catalog::{PlaylistCatalog, Rendition, RenditionCatalog, RenditionKind};
use crate::config::{ExtractorConfig, ExtractorMode};
use crate::proxy::MediaByteSource;
use crate::reference::{MediaReference, PlaylistReference};

/// Errors produced by an extraction backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractorError {
    #[error("Extraction failed: {cause}")]
    Failed { cause: String },

    #[error("Extraction timed out after {limit:?}")]
    Timeout { limit: Duration },

    #[error("Extractor tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    #[error("Malformed extractor output: {reason}")]
    MalformedOutput { reason: String },
}

/// A media-information provider.
///
/// Implementations may spawn subprocesses or perform network calls, but
/// every failure mode surfaces as an [`ExtractorError`] within the
/// configured timeout; a hang in the external tool must not block the
/// caller indefinitely.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Resolves the full rendition catalog for one media item.
    async fn catalog(&self, reference: &MediaReference)
    -> Result<RenditionCatalog, ExtractorError>;

    /// Resolves playlist identity and membership in flat mode.
    async fn playlist(
        &self,
        reference: &PlaylistReference,
    ) -> Result<PlaylistCatalog, ExtractorError>;

    /// Opens the byte stream for a previously selected rendition.
    async fn open_stream(
        &self,
        reference: &MediaReference,
        rendition: &Rendition,
        kind: RenditionKind,
    ) -> Result<MediaByteSource, ExtractorError>;
}

/// Builds the extraction backend named by the configuration.
pub fn extractor_from_config(config: &ExtractorConfig) -> Arc<dyn MediaExtractor> {
    match config.mode {
        ExtractorMode::Subprocess => Arc::new(YtDlpExtractor::new(config)),
        ExtractorMode::Remote => Arc::new(RemoteApiExtractor::new(config)),
    }
}
