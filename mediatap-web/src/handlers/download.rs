//! Byte-streaming endpoints.
//!
//! Every failure up to the point where the byte source is open maps to a
//! JSON error status. Once the attachment response is built the headers
//! are committed; a later source failure truncates the body and is logged
//! by the stream session, never surfaced as a second response.

use axum::body::Body;
use axum::extract::State;
use axum::http::Response;
use axum::Json;
use mediatap_core::archive::build_playlist_archive;
use mediatap_core::proxy::{archive_response, attachment_response};
use mediatap_core::reference::{MediaReference, PlaylistReference};
use mediatap_core::selector::select_rendition;
use tracing::info;

use super::DownloadRequest;
use crate::error::ApiError;
use crate::server::AppState;

/// POST /api/download-proxy
///
/// Resolves, selects, opens the byte source, and relays it as an
/// attachment.
pub async fn download_proxy(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response<Body>, ApiError> {
    let reference = MediaReference::parse(&request.url)?;
    let catalog = state.extractor.catalog(&reference).await?;
    let selected = select_rendition(&catalog, request.format, request.quality)?;

    let source = state
        .extractor
        .open_stream(&reference, &selected.rendition, request.format)
        .await?;

    info!(
        video_id = %reference.video_id(),
        kind = %request.format,
        quality = %selected.quality_label,
        "Proxy download started"
    );

    Ok(attachment_response(source, &catalog.title, request.format))
}

/// POST /api/download-playlist
///
/// Fetches the capped member set, archives it, and relays the archive.
/// Partial member failures are skipped inside the archive builder; only a
/// batch where every member failed becomes an error response.
pub async fn download_playlist(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response<Body>, ApiError> {
    let reference = PlaylistReference::parse(&request.url)?;
    let playlist = state.extractor.playlist(&reference).await?;

    let archive = build_playlist_archive(
        &state.extractor,
        &playlist,
        request.format,
        request.quality,
        state.config.playlist.max_members,
    )
    .await?;

    info!(
        entries = archive.entry_count,
        skipped = archive.skipped,
        "Playlist download started"
    );

    let title = playlist.title.clone();
    let source = archive.open_stream().await?;
    Ok(archive_response(source, &title))
}
