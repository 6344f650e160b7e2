//! Request handlers for the HTTP API.

pub mod download;
pub mod media;
pub mod payments;

use mediatap_core::catalog::{QualityTier, RenditionKind};
use serde::Deserialize;

/// Body shared by the metadata and playlist-videos endpoints.
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// Body shared by the link, proxy, and playlist download endpoints.
///
/// Kind defaults to video, quality to the lowest tier, matching what an
/// omitted field means everywhere else in the system.
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    #[serde(default)]
    pub format: RenditionKind,
    #[serde(default)]
    pub quality: QualityTier,
}
