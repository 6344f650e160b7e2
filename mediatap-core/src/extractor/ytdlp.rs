//! Subprocess extraction backend driving the yt-dlp binary.
//!
//! The binary is always invoked with an argument vector, never through a
//! shell, and the validated URL is passed as a single isolated argument
//! after `--`. Information calls run under the configured timeout; byte
//! streams are read from the child's stdout and the child is spawned with
//! kill-on-drop so an abandoned stream terminates it.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error};

use super::{ExtractorError, MediaExtractor};
use crate::catalog::{
    PlaylistCatalog, PlaylistEntry, Rendition, RenditionCatalog, RenditionKind,
};
use crate::config::ExtractorConfig;
use crate::proxy::MediaByteSource;
use crate::reference::{MediaReference, PlaylistReference};

/// Subprocess-mode extractor.
pub struct YtDlpExtractor {
    binary_path: String,
    extract_timeout: Duration,
    user_agent: &'static str,
}

impl YtDlpExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            extract_timeout: config.extract_timeout,
            user_agent: config.user_agent,
        }
    }

    /// Arguments for a single-item metadata dump.
    fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--skip-download".to_string(),
        ]);
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Arguments for a flat playlist dump: membership without per-member
    /// format resolution.
    fn playlist_args(&self, url: &str) -> Vec<String> {
        let mut args = self.common_args();
        args.extend([
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            "--skip-download".to_string(),
        ]);
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    /// Arguments for streaming one rendition to stdout.
    ///
    /// Audio requests add the extractor's own transcode flags so the bytes
    /// arriving on stdout are already MP3.
    fn stream_args(&self, url: &str, rendition: &Rendition, kind: RenditionKind) -> Vec<String> {
        let mut args = self.common_args();
        args.extend(["-f".to_string(), rendition.locator.clone()]);
        if kind == RenditionKind::Audio {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
            ]);
        }
        args.extend([
            "--no-playlist".to_string(),
            "-o".to_string(),
            "-".to_string(),
        ]);
        args.extend(["--".to_string(), url.to_string()]);
        args
    }

    fn common_args(&self) -> Vec<String> {
        vec![
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.extract_timeout.as_secs().to_string(),
            "--retries".to_string(),
            "2".to_string(),
            "--user-agent".to_string(),
            self.user_agent.to_string(),
        ]
    }

    /// Runs the binary to completion under the extraction timeout.
    ///
    /// Dropping the in-flight future on timeout kills the child, so a hung
    /// extractor surfaces as a timeout failure instead of blocking.
    async fn run_for_output(&self, args: Vec<String>) -> Result<Vec<u8>, ExtractorError> {
        debug!(binary = %self.binary_path, "Running extractor: {}", args.join(" "));

        let mut command = Command::new(&self.binary_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.extract_timeout, command.output())
            .await
            .map_err(|_| ExtractorError::Timeout {
                limit: self.extract_timeout,
            })?
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExtractorError::ToolUnavailable {
                    tool: self.binary_path.clone(),
                },
                _ => ExtractorError::Failed {
                    cause: e.to_string(),
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                status = ?output.status.code(),
                "Extractor exited non-zero: {}",
                stderr.trim()
            );
            return Err(ExtractorError::Failed {
                cause: format!("extractor exit status {:?}", output.status.code()),
            });
        }

        Ok(output.stdout)
    }

    /// Parses a `--dump-json` document into a catalog.
    ///
    /// Missing optional fields default to empty strings and zero counts.
    fn parse_catalog(stdout: &[u8]) -> Result<RenditionCatalog, ExtractorError> {
        let json: serde_json::Value =
            serde_json::from_slice(stdout).map_err(|e| ExtractorError::MalformedOutput {
                reason: format!("invalid JSON: {e}"),
            })?;

        let formats = json["formats"]
            .as_array()
            .ok_or_else(|| ExtractorError::MalformedOutput {
                reason: "no formats array in extractor output".to_string(),
            })?;

        let mut video = Vec::new();
        let mut audio = Vec::new();

        for format in formats {
            let vcodec = format["vcodec"].as_str().unwrap_or("none");
            let acodec = format["acodec"].as_str().unwrap_or("none");
            let has_video = vcodec != "none" && !vcodec.is_empty();
            let has_audio = acodec != "none" && !acodec.is_empty();

            let rendition = Rendition {
                kind: if has_video {
                    RenditionKind::Video
                } else {
                    RenditionKind::Audio
                },
                height: format["height"].as_u64().map(|h| h as u32),
                bitrate: format["abr"].as_f64().map(|b| b as f32),
                container: format["ext"].as_str().unwrap_or("").to_string(),
                locator: format["format_id"].as_str().unwrap_or("").to_string(),
                direct_url: format["url"].as_str().unwrap_or("").to_string(),
            };

            if has_video {
                video.push(rendition);
            } else if has_audio {
                audio.push(rendition);
            }
            // Storyboard/no-media formats are skipped entirely.
        }

        Ok(RenditionCatalog {
            id: json["id"].as_str().unwrap_or("").to_string(),
            title: json["title"].as_str().unwrap_or("").to_string(),
            duration_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
            channel: json["uploader"].as_str().unwrap_or("").to_string(),
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            view_count: json["view_count"].as_u64().unwrap_or(0),
            video,
            audio,
        })
    }

    /// Parses a `--flat-playlist --dump-single-json` document.
    fn parse_playlist(stdout: &[u8]) -> Result<PlaylistCatalog, ExtractorError> {
        let json: serde_json::Value =
            serde_json::from_slice(stdout).map_err(|e| ExtractorError::MalformedOutput {
                reason: format!("invalid JSON: {e}"),
            })?;

        let entries = json["entries"]
            .as_array()
            .ok_or_else(|| ExtractorError::MalformedOutput {
                reason: "no entries array in playlist output".to_string(),
            })?
            .iter()
            .filter_map(|entry| {
                let video_id = entry["id"].as_str()?;
                Some(PlaylistEntry {
                    video_id: video_id.to_string(),
                    title: entry["title"].as_str().unwrap_or("").to_string(),
                    duration_seconds: entry["duration"].as_f64().unwrap_or(0.0) as u64,
                })
            })
            .collect();

        let thumbnail = json["thumbnails"]
            .as_array()
            .and_then(|thumbs| thumbs.last())
            .and_then(|thumb| thumb["url"].as_str())
            .unwrap_or("")
            .to_string();

        Ok(PlaylistCatalog {
            title: json["title"].as_str().unwrap_or("").to_string(),
            thumbnail,
            entries,
        })
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn catalog(
        &self,
        reference: &MediaReference,
    ) -> Result<RenditionCatalog, ExtractorError> {
        let stdout = self.run_for_output(self.info_args(reference.url())).await?;
        Self::parse_catalog(&stdout)
    }

    async fn playlist(
        &self,
        reference: &PlaylistReference,
    ) -> Result<PlaylistCatalog, ExtractorError> {
        let stdout = self
            .run_for_output(self.playlist_args(reference.url()))
            .await?;
        Self::parse_playlist(&stdout)
    }

    async fn open_stream(
        &self,
        reference: &MediaReference,
        rendition: &Rendition,
        kind: RenditionKind,
    ) -> Result<MediaByteSource, ExtractorError> {
        let args = self.stream_args(reference.url(), rendition, kind);
        debug!(binary = %self.binary_path, "Streaming extractor: {}", args.join(" "));

        // Stderr is captured so a failed extraction surfaces in the stream
        // error instead of vanishing with a zero-byte payload.
        let child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExtractorError::ToolUnavailable {
                    tool: self.binary_path.clone(),
                },
                _ => ExtractorError::Failed {
                    cause: e.to_string(),
                },
            })?;

        MediaByteSource::from_child(child).map_err(|e| ExtractorError::Failed {
            cause: e.to_string(),
        })
    }
}
