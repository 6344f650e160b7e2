//! Remote extraction backend resolving catalogs over HTTP.
//!
//! Direct-library deployments front a metadata service that performs the
//! actual extraction. Catalog and playlist lookups are bounded by the
//! configured timeout; rendition bytes are streamed straight from the
//! locator URL with no total timeout, since a relay can legitimately run
//! long.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{ExtractorError, MediaExtractor};
use crate::catalog::{
    PlaylistCatalog, PlaylistEntry, Rendition, RenditionCatalog, RenditionKind,
};
use crate::config::ExtractorConfig;
use crate::proxy::MediaByteSource;
use crate::reference::{MediaReference, PlaylistReference};

/// Remote-mode extractor.
pub struct RemoteApiExtractor {
    /// Client for catalog lookups, bounded by the extraction timeout.
    api_client: reqwest::Client,
    /// Client for byte streams: connect timeout only.
    stream_client: reqwest::Client,
    api_base: String,
    extract_timeout: std::time::Duration,
}

/// Wire shape of a media document from the metadata service.
#[derive(Debug, Deserialize)]
struct MediaDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel: String,
    #[serde(default)]
    duration_seconds: u64,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    view_count: u64,
    #[serde(default)]
    video: Vec<VideoFormatDocument>,
    #[serde(default)]
    audio: Vec<AudioFormatDocument>,
}

#[derive(Debug, Deserialize)]
struct VideoFormatDocument {
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    container: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct AudioFormatDocument {
    #[serde(default)]
    bitrate: Option<f32>,
    #[serde(default)]
    container: String,
    #[serde(default)]
    url: String,
}

/// Wire shape of a playlist document from the metadata service.
#[derive(Debug, Deserialize)]
struct PlaylistDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    entries: Vec<PlaylistEntryDocument>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntryDocument {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    duration_seconds: u64,
}

impl RemoteApiExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        let api_client = reqwest::Client::builder()
            .timeout(config.extract_timeout)
            .user_agent(config.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.extract_timeout)
            .user_agent(config.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_client,
            stream_client,
            api_base: config.remote_api_base.trim_end_matches('/').to_string(),
            extract_timeout: config.extract_timeout,
        }
    }

    fn map_request_error(error: reqwest::Error, timeout: std::time::Duration) -> ExtractorError {
        if error.is_timeout() {
            ExtractorError::Timeout { limit: timeout }
        } else if error.is_decode() {
            ExtractorError::MalformedOutput {
                reason: error.to_string(),
            }
        } else {
            ExtractorError::Failed {
                cause: error.to_string(),
            }
        }
    }

    fn catalog_from_document(document: MediaDocument) -> RenditionCatalog {
        RenditionCatalog {
            id: document.id,
            title: document.title,
            duration_seconds: document.duration_seconds,
            channel: document.channel,
            thumbnail: document.thumbnail,
            view_count: document.view_count,
            video: document
                .video
                .into_iter()
                .map(|format| Rendition {
                    kind: RenditionKind::Video,
                    height: format.height,
                    bitrate: None,
                    container: format.container,
                    locator: format.url.clone(),
                    direct_url: format.url,
                })
                .collect(),
            audio: document
                .audio
                .into_iter()
                .map(|format| Rendition {
                    kind: RenditionKind::Audio,
                    height: None,
                    bitrate: format.bitrate,
                    container: format.container,
                    locator: format.url.clone(),
                    direct_url: format.url,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MediaExtractor for RemoteApiExtractor {
    fn name(&self) -> &'static str {
        "remote-api"
    }

    async fn catalog(
        &self,
        reference: &MediaReference,
    ) -> Result<RenditionCatalog, ExtractorError> {
        let endpoint = format!("{}/media/{}", self.api_base, reference.video_id());
        debug!(%endpoint, "Resolving catalog via metadata service");

        let response = self
            .api_client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, self.extract_timeout))?;

        if !response.status().is_success() {
            return Err(ExtractorError::Failed {
                cause: format!("metadata service returned status {}", response.status()),
            });
        }

        let document: MediaDocument = response
            .json()
            .await
            .map_err(|e| ExtractorError::MalformedOutput {
                reason: e.to_string(),
            })?;

        Ok(Self::catalog_from_document(document))
    }

    async fn playlist(
        &self,
        reference: &PlaylistReference,
    ) -> Result<PlaylistCatalog, ExtractorError> {
        let endpoint = format!("{}/playlists/{}", self.api_base, reference.playlist_id());
        debug!(%endpoint, "Resolving playlist via metadata service");

        let response = self
            .api_client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, self.extract_timeout))?;

        if !response.status().is_success() {
            return Err(ExtractorError::Failed {
                cause: format!("metadata service returned status {}", response.status()),
            });
        }

        let document: PlaylistDocument = response
            .json()
            .await
            .map_err(|e| ExtractorError::MalformedOutput {
                reason: e.to_string(),
            })?;

        Ok(PlaylistCatalog {
            title: document.title,
            thumbnail: document.thumbnail,
            entries: document
                .entries
                .into_iter()
                .map(|entry| PlaylistEntry {
                    video_id: entry.id,
                    title: entry.title,
                    duration_seconds: entry.duration_seconds,
                })
                .collect(),
        })
    }

    async fn open_stream(
        &self,
        _reference: &MediaReference,
        rendition: &Rendition,
        _kind: RenditionKind,
    ) -> Result<MediaByteSource, ExtractorError> {
        let response = self
            .stream_client
            .get(&rendition.locator)
            .send()
            .await
            .map_err(|e| ExtractorError::Failed {
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ExtractorError::Failed {
                cause: format!("rendition source returned status {}", response.status()),
            });
        }

        Ok(MediaByteSource::from_http(response))
    }
}
