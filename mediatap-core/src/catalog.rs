//! Rendition catalog data model.
//!
//! A catalog is built fresh per resolution request, owned by that request,
//! and discarded once the response is sent. Renditions keep extractor-defined
//! ordering; nothing is merged or deduplicated.

use serde::{Deserialize, Serialize};

/// Whether a rendition carries video or audio-only content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenditionKind {
    Video,
    Audio,
}

impl Default for RenditionKind {
    fn default() -> Self {
        Self::Video
    }
}

impl std::str::FromStr for RenditionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            _ => Err(format!(
                "Invalid format: '{s}'. Valid options are: video, audio"
            )),
        }
    }
}

impl std::fmt::Display for RenditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Caller-facing coarse quality bucket.
///
/// Mapped internally to a maximum-height ceiling for video selection.
/// Audio ignores the tier and always takes the best available bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    /// Maximum video height in pixels allowed for this tier.
    pub fn height_ceiling(self) -> u32 {
        match self {
            Self::Low => 480,
            Self::Medium => 720,
            Self::High => 1080,
            Self::Ultra => 2160,
        }
    }
}

impl Default for QualityTier {
    fn default() -> Self {
        // Lowest tier is the safe default when the caller does not ask.
        Self::Low
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            _ => Err(format!(
                "Invalid quality tier: '{s}'. Valid options are: low, medium, high, ultra"
            )),
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Ultra => write!(f, "ultra"),
        }
    }
}

/// One concrete encoded variant of a media item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub kind: RenditionKind,
    /// Height in pixels; video renditions only
    pub height: Option<u32>,
    /// Bitrate in kbps; audio renditions only
    pub bitrate: Option<f32>,
    /// Container / codec tag as reported by the extractor
    pub container: String,
    /// Opaque locator used to open the byte stream: a direct URL or an
    /// extractor-internal format id
    pub locator: String,
    /// Direct media URL when the extractor reports one; empty otherwise
    pub direct_url: String,
}

impl Rendition {
    /// Human-readable quality label for headers and metadata.
    pub fn quality_label(&self) -> String {
        match self.kind {
            RenditionKind::Video => self
                .height
                .map(|h| format!("{h}p"))
                .unwrap_or_else(|| "video".to_string()),
            RenditionKind::Audio => self
                .bitrate
                .map(|b| format!("{}kbps", b.round() as u32))
                .unwrap_or_else(|| "audio".to_string()),
        }
    }
}

/// Everything the extractor reported about one media item.
///
/// Missing optional fields default to documented sentinels: empty string
/// for text, zero for numeric counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenditionCatalog {
    pub id: String,
    pub title: String,
    pub duration_seconds: u64,
    pub channel: String,
    pub thumbnail: String,
    pub view_count: u64,
    /// Video renditions in extractor-defined order
    pub video: Vec<Rendition>,
    /// Audio-only renditions in extractor-defined order
    pub audio: Vec<Rendition>,
}

/// One member of a playlist, as reported by a flat extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub video_id: String,
    pub title: String,
    pub duration_seconds: u64,
}

/// Playlist identity and membership.
///
/// Built by running the extractor in flat mode; same per-request lifetime
/// rules as [`RenditionCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistCatalog {
    pub title: String,
    pub thumbnail: String,
    pub entries: Vec<PlaylistEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ceilings() {
        assert_eq!(QualityTier::Low.height_ceiling(), 480);
        assert_eq!(QualityTier::Medium.height_ceiling(), 720);
        assert_eq!(QualityTier::High.height_ceiling(), 1080);
        assert_eq!(QualityTier::Ultra.height_ceiling(), 2160);
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("medium".parse::<QualityTier>(), Ok(QualityTier::Medium));
        assert_eq!("ULTRA".parse::<QualityTier>(), Ok(QualityTier::Ultra));
        assert!("4k".parse::<QualityTier>().is_err());
        assert_eq!(QualityTier::default(), QualityTier::Low);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("audio".parse::<RenditionKind>(), Ok(RenditionKind::Audio));
        assert_eq!(RenditionKind::default(), RenditionKind::Video);
        assert!("subtitles".parse::<RenditionKind>().is_err());
    }

    #[test]
    fn test_quality_labels() {
        let video = Rendition {
            kind: RenditionKind::Video,
            height: Some(720),
            bitrate: None,
            container: "mp4".to_string(),
            locator: "22".to_string(),
            direct_url: String::new(),
        };
        assert_eq!(video.quality_label(), "720p");

        let audio = Rendition {
            kind: RenditionKind::Audio,
            height: None,
            bitrate: Some(129.5),
            container: "m4a".to_string(),
            locator: "140".to_string(),
            direct_url: String::new(),
        };
        assert_eq!(audio.quality_label(), "130kbps");
    }
}
