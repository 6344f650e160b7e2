//! Metadata-shaped endpoints: health, metadata, direct links, playlist
//! member lists. Nothing here streams bytes.

use axum::Json;
use axum::extract::State;
use mediatap_core::metadata::{
    DownloadLinkResponse, MetadataResponse, PlaylistResponse, RenditionListing, metadata_response,
    playlist_response, rendition_listings,
};
use mediatap_core::reference::{MediaReference, PlaylistReference};
use mediatap_core::selector::select_rendition;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{DownloadRequest, UrlRequest};
use crate::error::ApiError;
use crate::server::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "backend": state.extractor.name(),
        "supported_sources": ["youtube.com", "youtu.be"],
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Metadata plus the full rendition listing for one media item.
#[derive(Debug, Serialize)]
pub struct MetadataBody {
    #[serde(flatten)]
    pub metadata: MetadataResponse,
    pub renditions: Vec<RenditionListing>,
}

/// POST /api/metadata
pub async fn metadata(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<MetadataBody>, ApiError> {
    let reference = MediaReference::parse(&request.url)?;
    let catalog = state.extractor.catalog(&reference).await?;

    debug!(video_id = %reference.video_id(), "Metadata resolved");
    Ok(Json(MetadataBody {
        metadata: metadata_response(&catalog),
        renditions: rendition_listings(&catalog),
    }))
}

/// POST /api/download-link
///
/// Resolves the direct locator for the selected rendition without
/// proxying any bytes.
pub async fn download_link(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<DownloadLinkResponse>, ApiError> {
    let reference = MediaReference::parse(&request.url)?;
    let catalog = state.extractor.catalog(&reference).await?;
    let selected = select_rendition(&catalog, request.format, request.quality)?;

    // Subprocess catalogs carry an upstream URL per rendition; fall back
    // to the opaque locator when the backend reported none.
    let url = if selected.rendition.direct_url.is_empty() {
        selected.rendition.locator.clone()
    } else {
        selected.rendition.direct_url.clone()
    };

    Ok(Json(DownloadLinkResponse {
        url,
        title: catalog.title,
        quality: selected.quality_label,
    }))
}

/// POST /api/playlist-videos
pub async fn playlist_videos(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<PlaylistResponse>, ApiError> {
    let reference = PlaylistReference::parse(&request.url)?;
    let playlist = state.extractor.playlist(&reference).await?;

    Ok(Json(playlist_response(
        &playlist,
        state.config.playlist.max_members,
    )))
}
