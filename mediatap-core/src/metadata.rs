//! Caller-facing response shaping.
//!
//! Pure transformations from catalogs into the JSON structures the HTTP
//! surface returns. No I/O happens here; repeated calls over the same
//! catalog yield identical values.

use serde::Serialize;

use crate::catalog::{PlaylistCatalog, Rendition, RenditionCatalog};
use crate::reference::MediaReference;

/// Body of a successful `/api/metadata` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataResponse {
    pub title: String,
    pub thumbnail: String,
    pub duration: u64,
    pub channel: String,
    pub views: u64,
}

/// Body of a successful `/api/download-link` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadLinkResponse {
    pub url: String,
    pub title: String,
    pub quality: String,
}

/// One rendition entry in a full listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenditionListing {
    pub kind: String,
    pub quality: String,
    pub container: String,
    pub locator: String,
}

/// One member in a `/api/playlist-videos` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistVideo {
    pub id: String,
    pub title: String,
    pub duration: u64,
    pub url: String,
}

/// Body of a successful `/api/playlist-videos` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistResponse {
    pub playlist_title: String,
    pub thumbnail: String,
    pub video_count: usize,
    pub videos: Vec<PlaylistVideo>,
}

/// Shapes a catalog into the metadata response.
pub fn metadata_response(catalog: &RenditionCatalog) -> MetadataResponse {
    MetadataResponse {
        title: catalog.title.clone(),
        thumbnail: catalog.thumbnail.clone(),
        duration: catalog.duration_seconds,
        channel: catalog.channel.clone(),
        views: catalog.view_count,
    }
}

/// Shapes the full rendition list with quality labels and locators.
pub fn rendition_listings(catalog: &RenditionCatalog) -> Vec<RenditionListing> {
    catalog
        .video
        .iter()
        .chain(catalog.audio.iter())
        .map(listing)
        .collect()
}

fn listing(rendition: &Rendition) -> RenditionListing {
    RenditionListing {
        kind: rendition.kind.to_string(),
        quality: rendition.quality_label(),
        container: rendition.container.clone(),
        locator: rendition.locator.clone(),
    }
}

/// Shapes a playlist catalog into the member-list response.
///
/// `video_count` reports the playlist's full size; the member list itself
/// is capped by the caller.
pub fn playlist_response(playlist: &PlaylistCatalog, max_members: usize) -> PlaylistResponse {
    PlaylistResponse {
        playlist_title: playlist.title.clone(),
        thumbnail: playlist.thumbnail.clone(),
        video_count: playlist.entries.len(),
        videos: playlist
            .entries
            .iter()
            .take(max_members)
            .filter_map(|entry| {
                let reference = MediaReference::from_video_id(&entry.video_id).ok()?;
                Some(PlaylistVideo {
                    id: entry.video_id.clone(),
                    title: entry.title.clone(),
                    duration: entry.duration_seconds,
                    url: reference.url().to_string(),
                })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlaylistEntry;

    fn sample_catalog() -> RenditionCatalog {
        RenditionCatalog {
            id: "AAAAAAAAAAA".to_string(),
            title: "Sample".to_string(),
            duration_seconds: 212,
            channel: "Channel".to_string(),
            thumbnail: "https://example.com/t.jpg".to_string(),
            view_count: 1234,
            video: vec![Rendition {
                kind: crate::catalog::RenditionKind::Video,
                height: Some(720),
                bitrate: None,
                container: "mp4".to_string(),
                locator: "22".to_string(),
                direct_url: "https://cdn.example/v".to_string(),
            }],
            audio: vec![Rendition {
                kind: crate::catalog::RenditionKind::Audio,
                height: None,
                bitrate: Some(128.0),
                container: "m4a".to_string(),
                locator: "140".to_string(),
                direct_url: "https://cdn.example/a".to_string(),
            }],
        }
    }

    #[test]
    fn test_metadata_shape() {
        let response = metadata_response(&sample_catalog());
        assert_eq!(response.title, "Sample");
        assert_eq!(response.duration, 212);
        assert_eq!(response.channel, "Channel");
        assert_eq!(response.views, 1234);
    }

    #[test]
    fn test_metadata_is_idempotent() {
        // Same catalog, repeated shaping: identical field values, no
        // hidden mutation across calls.
        let catalog = sample_catalog();
        assert_eq!(metadata_response(&catalog), metadata_response(&catalog));
        assert_eq!(rendition_listings(&catalog), rendition_listings(&catalog));
    }

    #[test]
    fn test_rendition_listings_cover_both_kinds() {
        let listings = rendition_listings(&sample_catalog());
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].kind, "video");
        assert_eq!(listings[0].quality, "720p");
        assert_eq!(listings[1].kind, "audio");
        assert_eq!(listings[1].quality, "128kbps");
    }

    #[test]
    fn test_playlist_response_caps_members_but_reports_full_count() {
        let playlist = PlaylistCatalog {
            title: "Mix".to_string(),
            thumbnail: String::new(),
            entries: (0..5)
                .map(|i| PlaylistEntry {
                    video_id: format!("AAAAAAAAAA{i}"),
                    title: format!("Track {i}"),
                    duration_seconds: 60,
                })
                .collect(),
        };

        let response = playlist_response(&playlist, 3);
        assert_eq!(response.video_count, 5);
        assert_eq!(response.videos.len(), 3);
        assert_eq!(
            response.videos[0].url,
            "https://www.youtube.com/watch?v=AAAAAAAAAA0"
        );
    }
}
