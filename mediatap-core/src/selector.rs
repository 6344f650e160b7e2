//! Deterministic rendition selection.
//!
//! Pure function from (catalog, requested kind, requested tier) to one
//! chosen rendition. Audio takes the best available bitrate; video takes
//! the largest height under the tier's ceiling and degrades to the
//! catalog's first entry when nothing fits. Callers would rather get some
//! video than a hard error when an exact resolution is missing.

use crate::catalog::{QualityTier, Rendition, RenditionCatalog, RenditionKind};

/// Errors produced while choosing a rendition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("No {kind} rendition available for this media")]
    NoMatchingRendition { kind: RenditionKind },
}

/// The outcome of selection: the rendition plus its resolved display label.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRendition {
    pub rendition: Rendition,
    pub quality_label: String,
}

/// Picks one rendition from the catalog under the quality-fallback policy.
///
/// # Errors
///
/// - `SelectorError::NoMatchingRendition` - If the catalog has no entry of
///   the requested kind at all
pub fn select_rendition(
    catalog: &RenditionCatalog,
    kind: RenditionKind,
    tier: QualityTier,
) -> Result<SelectedRendition, SelectorError> {
    let chosen = match kind {
        RenditionKind::Audio => best_audio(&catalog.audio),
        RenditionKind::Video => best_video_under(&catalog.video, tier.height_ceiling()),
    }
    .ok_or(SelectorError::NoMatchingRendition { kind })?;

    Ok(SelectedRendition {
        quality_label: chosen.quality_label(),
        rendition: chosen.clone(),
    })
}

/// Highest bitrate wins; ties break toward catalog order (first wins).
fn best_audio(renditions: &[Rendition]) -> Option<&Rendition> {
    renditions.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            if bitrate_key(candidate) > bitrate_key(current) {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    })
}

fn bitrate_key(rendition: &Rendition) -> u32 {
    rendition.bitrate.map(|b| (b * 100.0) as u32).unwrap_or(0)
}

/// Largest height not exceeding the ceiling, or the first catalog entry as
/// the best-effort fallback when every height is above the ceiling.
fn best_video_under(renditions: &[Rendition], ceiling: u32) -> Option<&Rendition> {
    let within = renditions.iter().fold(None, |best, candidate| {
        let height = candidate.height.unwrap_or(0);
        if height > ceiling {
            return best;
        }
        match best {
            None => Some(candidate),
            Some(current) => {
                if height > current.height.unwrap_or(0) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        }
    });

    within.or_else(|| renditions.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(height: u32, locator: &str) -> Rendition {
        Rendition {
            kind: RenditionKind::Video,
            height: Some(height),
            bitrate: None,
            container: "mp4".to_string(),
            locator: locator.to_string(),
            direct_url: String::new(),
        }
    }

    fn audio(bitrate: f32, locator: &str) -> Rendition {
        Rendition {
            kind: RenditionKind::Audio,
            height: None,
            bitrate: Some(bitrate),
            container: "m4a".to_string(),
            locator: locator.to_string(),
            direct_url: String::new(),
        }
    }

    fn catalog_with(video_heights: &[u32], audio_bitrates: &[f32]) -> RenditionCatalog {
        RenditionCatalog {
            id: "AAAAAAAAAAA".to_string(),
            title: "Test".to_string(),
            duration_seconds: 60,
            channel: "Channel".to_string(),
            thumbnail: String::new(),
            view_count: 0,
            video: video_heights
                .iter()
                .enumerate()
                .map(|(i, h)| video(*h, &format!("v{i}")))
                .collect(),
            audio: audio_bitrates
                .iter()
                .enumerate()
                .map(|(i, b)| audio(*b, &format!("a{i}")))
                .collect(),
        }
    }

    #[test]
    fn test_video_selects_largest_under_ceiling() {
        let catalog = catalog_with(&[360, 480, 720], &[]);

        let medium = select_rendition(&catalog, RenditionKind::Video, QualityTier::Medium)
            .expect("medium tier");
        assert_eq!(medium.rendition.height, Some(720));
        assert_eq!(medium.quality_label, "720p");

        let low =
            select_rendition(&catalog, RenditionKind::Video, QualityTier::Low).expect("low tier");
        assert_eq!(low.rendition.height, Some(480));
    }

    #[test]
    fn test_video_ceiling_above_all_heights_takes_largest() {
        // Ultra allows up to 2160 but only 720 exists: pick 720.
        let catalog = catalog_with(&[360, 480, 720], &[]);
        let chosen = select_rendition(&catalog, RenditionKind::Video, QualityTier::Ultra)
            .expect("ultra tier");
        assert_eq!(chosen.rendition.height, Some(720));
    }

    #[test]
    fn test_video_falls_back_to_first_when_all_exceed_ceiling() {
        // Every height above the low ceiling: degrade to catalog order,
        // never fail.
        let catalog = catalog_with(&[1080, 1440, 2160], &[]);
        let chosen =
            select_rendition(&catalog, RenditionKind::Video, QualityTier::Low).expect("fallback");
        assert_eq!(chosen.rendition.height, Some(1080));
        assert_eq!(chosen.rendition.locator, "v0");
    }

    #[test]
    fn test_video_absent_kind_fails() {
        let catalog = catalog_with(&[], &[128.0]);
        let result = select_rendition(&catalog, RenditionKind::Video, QualityTier::High);
        assert_eq!(
            result,
            Err(SelectorError::NoMatchingRendition {
                kind: RenditionKind::Video
            })
        );
    }

    #[test]
    fn test_audio_selects_highest_bitrate() {
        let catalog = catalog_with(&[], &[48.0, 160.0, 128.0]);
        let chosen =
            select_rendition(&catalog, RenditionKind::Audio, QualityTier::Low).expect("audio");
        assert_eq!(chosen.rendition.bitrate, Some(160.0));
        assert_eq!(chosen.quality_label, "160kbps");
    }

    #[test]
    fn test_audio_tie_breaks_toward_catalog_order() {
        let catalog = catalog_with(&[], &[128.0, 128.0]);
        let chosen =
            select_rendition(&catalog, RenditionKind::Audio, QualityTier::Low).expect("audio");
        assert_eq!(chosen.rendition.locator, "a0");
    }

    #[test]
    fn test_audio_absent_kind_fails() {
        let catalog = catalog_with(&[720], &[]);
        let result = select_rendition(&catalog, RenditionKind::Audio, QualityTier::Low);
        assert_eq!(
            result,
            Err(SelectorError::NoMatchingRendition {
                kind: RenditionKind::Audio
            })
        );
    }

    #[test]
    fn test_selection_is_deterministic() {
        let catalog = catalog_with(&[360, 480, 720], &[96.0, 160.0]);
        let first = select_rendition(&catalog, RenditionKind::Video, QualityTier::Medium);
        let second = select_rendition(&catalog, RenditionKind::Video, QualityTier::Medium);
        assert_eq!(first, second);
    }
}
