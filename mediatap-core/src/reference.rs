//! Source URL validation and normalization.
//!
//! Parsing here is purely syntactic: no network I/O happens before a raw
//! string has been turned into a [`MediaReference`]. Anything that fails to
//! yield an embeddable identifier is rejected up front instead of being
//! handed to the extractor.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Hosts recognized as valid media sources.
const RECOGNIZED_HOSTS: &[&str] = &[
    "www.youtube.com",
    "youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// An embeddable video identifier: exactly 11 URL-safe characters.
static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"));

/// Playlist identifiers are longer and prefixed, but share the alphabet.
static PLAYLIST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{13,}$").expect("valid regex"));

/// Errors produced while validating a source URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("Invalid media URL: {reason}")]
    InvalidReference { reason: String },
}

impl ReferenceError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reason: reason.into(),
        }
    }
}

/// Normalized, validated identity for a single media item.
///
/// Immutable once created. The canonical URL is rebuilt from the extracted
/// identifier, so downstream components never see the raw caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    canonical_url: String,
    video_id: String,
}

impl MediaReference {
    /// Validates a raw string and extracts the stable video identifier.
    ///
    /// Recognized shapes: `watch?v=<id>`, `youtu.be/<id>`, `/shorts/<id>`,
    /// `/embed/<id>`, and `/live/<id>`.
    ///
    /// # Errors
    ///
    /// - `ReferenceError::InvalidReference` - If the string is not a URL on a
    ///   recognized host or carries no 11-character identifier
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let url = parse_recognized(raw)?;

        let candidate = extract_video_id(&url)
            .ok_or_else(|| ReferenceError::invalid("no video identifier in URL"))?;

        if !VIDEO_ID.is_match(&candidate) {
            return Err(ReferenceError::invalid(format!(
                "malformed video identifier '{candidate}'"
            )));
        }

        Ok(Self {
            canonical_url: format!("https://www.youtube.com/watch?v={candidate}"),
            video_id: candidate,
        })
    }

    /// Builds a reference directly from an already-validated identifier.
    ///
    /// Used when expanding playlist members, whose identifiers come from the
    /// extractor rather than from caller input.
    pub fn from_video_id(video_id: &str) -> Result<Self, ReferenceError> {
        if !VIDEO_ID.is_match(video_id) {
            return Err(ReferenceError::invalid(format!(
                "malformed video identifier '{video_id}'"
            )));
        }
        Ok(Self {
            canonical_url: format!("https://www.youtube.com/watch?v={video_id}"),
            video_id: video_id.to_string(),
        })
    }

    /// The normalized source URL safe to hand to the extractor.
    pub fn url(&self) -> &str {
        &self.canonical_url
    }

    /// The extracted stable identifier.
    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}

impl std::fmt::Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.video_id)
    }
}

/// Normalized, validated identity for a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReference {
    canonical_url: String,
    playlist_id: String,
}

impl PlaylistReference {
    /// Validates a raw string carrying a `list=` playlist identifier.
    ///
    /// # Errors
    ///
    /// - `ReferenceError::InvalidReference` - If the string is not a URL on a
    ///   recognized host or carries no playlist identifier
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let url = parse_recognized(raw)?;

        let candidate = url
            .query_pairs()
            .find(|(key, _)| key == "list")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| ReferenceError::invalid("no playlist identifier in URL"))?;

        if !PLAYLIST_ID.is_match(&candidate) {
            return Err(ReferenceError::invalid(format!(
                "malformed playlist identifier '{candidate}'"
            )));
        }

        Ok(Self {
            canonical_url: format!("https://www.youtube.com/playlist?list={candidate}"),
            playlist_id: candidate,
        })
    }

    /// The normalized playlist URL safe to hand to the extractor.
    pub fn url(&self) -> &str {
        &self.canonical_url
    }

    /// The extracted playlist identifier.
    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }
}

fn parse_recognized(raw: &str) -> Result<Url, ReferenceError> {
    let url = Url::parse(raw.trim()).map_err(|e| ReferenceError::invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ReferenceError::invalid(format!(
                "unsupported scheme '{other}'"
            )));
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| ReferenceError::invalid("missing host"))?;

    if !RECOGNIZED_HOSTS.contains(&host) {
        return Err(ReferenceError::invalid(format!(
            "unrecognized host '{host}'"
        )));
    }

    Ok(url)
}

fn extract_video_id(url: &Url) -> Option<String> {
    // Short-link form: the id is the first path segment.
    if url.host_str() == Some("youtu.be") {
        return url
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }

    // watch?v=<id>
    if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "v") {
        return Some(value.into_owned());
    }

    // /shorts/<id>, /embed/<id>, /live/<id>
    let segments: Vec<&str> = url.path_segments()?.collect();
    match segments.as_slice() {
        [prefix, id, ..] if matches!(*prefix, "shorts" | "embed" | "live") => {
            Some((*id).to_string())
        }
        _ => None,
    }
}
