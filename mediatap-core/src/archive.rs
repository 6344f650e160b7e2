//! Playlist batch downloads collected into a zip archive.
//!
//! Members are fetched one at a time through the single-item path and
//! spooled to a per-batch temporary workspace, then zipped on a blocking
//! task and streamed out. Bounded temp storage stands in for true
//! constant-memory zipping; the workspace is deleted when the archive
//! stream is dropped. A failing member is logged and skipped; the batch
//! only fails when every member does.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tempfile::TempDir;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::catalog::{PlaylistCatalog, QualityTier, RenditionKind};
use crate::extractor::MediaExtractor;
use crate::proxy::{self, MediaByteSource, ProxyError};
use crate::reference::MediaReference;
use crate::selector::select_rendition;

/// A finished archive waiting to be streamed.
///
/// Holds the temporary workspace alive until the stream is consumed or
/// dropped.
pub struct PlaylistArchive {
    workspace: TempDir,
    zip_path: PathBuf,
    /// Members successfully included
    pub entry_count: usize,
    /// Members skipped after a per-member failure
    pub skipped: usize,
}

impl PlaylistArchive {
    /// Opens the archive for streaming. Consumes the handle; the workspace
    /// lives inside the returned source and is removed once it drops.
    pub async fn open_stream(self) -> Result<MediaByteSource, ProxyError> {
        let file = tokio::fs::File::open(&self.zip_path).await?;
        Ok(MediaByteSource::from_stream(ArchiveStream {
            inner: ReaderStream::new(file),
            _workspace: self.workspace,
        }))
    }
}

/// Streams the finished zip while keeping its workspace directory alive.
struct ArchiveStream {
    inner: ReaderStream<tokio::fs::File>,
    _workspace: TempDir,
}

impl Stream for ArchiveStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Fetches up to `max_members` playlist members and zips them.
///
/// # Errors
///
/// - `ProxyError::BatchDownloadFailed` - If every attempted member failed
/// - `ProxyError::Archive` - If temp storage or zip writing fails
pub async fn build_playlist_archive(
    extractor: &Arc<dyn MediaExtractor>,
    playlist: &PlaylistCatalog,
    kind: RenditionKind,
    tier: QualityTier,
    max_members: usize,
) -> Result<PlaylistArchive, ProxyError> {
    let workspace = tempfile::tempdir()?;
    let extension = proxy::file_extension(kind);

    let mut members: Vec<(String, PathBuf)> = Vec::new();
    let mut attempted = 0usize;

    for (index, entry) in playlist.entries.iter().take(max_members).enumerate() {
        attempted += 1;

        let member_name = format!(
            "{:02} - {}.{}",
            index + 1,
            proxy::sanitize_filename(&entry.title),
            extension
        );
        let spool_path = workspace.path().join(&member_name);

        match fetch_member(extractor, &entry.video_id, kind, tier, &spool_path).await {
            Ok(bytes) => {
                debug!(video_id = %entry.video_id, bytes, "Playlist member spooled");
                members.push((member_name, spool_path));
            }
            Err(e) => {
                warn!(video_id = %entry.video_id, "Skipping playlist member: {e}");
                let _ = tokio::fs::remove_file(&spool_path).await;
            }
        }
    }

    if members.is_empty() {
        return Err(ProxyError::BatchDownloadFailed { attempted });
    }

    let entry_count = members.len();
    let skipped = attempted - entry_count;
    let zip_path = workspace.path().join("playlist.zip");

    let zip_target = zip_path.clone();
    tokio::task::spawn_blocking(move || write_archive(&zip_target, &members))
        .await
        .map_err(|e| ProxyError::Archive(io::Error::other(e)))??;

    info!(entry_count, skipped, "Playlist archive ready");

    Ok(PlaylistArchive {
        workspace,
        zip_path,
        entry_count,
        skipped,
    })
}

/// Runs the full single-item path for one member and spools the bytes to
/// disk. Returns the spooled size.
async fn fetch_member(
    extractor: &Arc<dyn MediaExtractor>,
    video_id: &str,
    kind: RenditionKind,
    tier: QualityTier,
    spool_path: &std::path::Path,
) -> Result<u64, ProxyError> {
    let reference =
        MediaReference::from_video_id(video_id).map_err(|e| ProxyError::SourceOpenFailed {
            cause: e.to_string(),
        })?;

    let catalog =
        extractor
            .catalog(&reference)
            .await
            .map_err(|e| ProxyError::SourceOpenFailed {
                cause: e.to_string(),
            })?;

    let selected =
        select_rendition(&catalog, kind, tier).map_err(|e| ProxyError::SourceOpenFailed {
            cause: e.to_string(),
        })?;

    let source = extractor
        .open_stream(&reference, &selected.rendition, kind)
        .await
        .map_err(|e| ProxyError::SourceOpenFailed {
            cause: e.to_string(),
        })?;

    let mut reader = StreamReader::new(source);
    let mut file = tokio::fs::File::create(spool_path).await?;
    let bytes = tokio::io::copy(&mut reader, &mut file).await?;
    Ok(bytes)
}

/// Zips spooled members. Media payloads are already compressed, so entries
/// are stored rather than deflated.
fn write_archive(zip_path: &std::path::Path, members: &[(String, PathBuf)]) -> io::Result<()> {
    let file = std::fs::File::create(zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, path) in members {
        writer
            .start_file(name.as_str(), options)
            .map_err(io::Error::other)?;
        let mut member = std::fs::File::open(path)?;
        io::copy(&mut member, &mut writer)?;
    }

    writer.finish().map_err(io::Error::other)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::{StreamExt, stream};

    use super::*;
    use crate::catalog::{PlaylistEntry, Rendition, RenditionCatalog};
    use crate::extractor::ExtractorError;
    use crate::reference::PlaylistReference;

    /// Extractor where members whose id starts with 'F' fail extraction.
    struct ScriptedExtractor;

    fn test_catalog(id: &str) -> RenditionCatalog {
        RenditionCatalog {
            id: id.to_string(),
            title: format!("Title {id}"),
            duration_seconds: 10,
            channel: "Channel".to_string(),
            thumbnail: String::new(),
            view_count: 0,
            video: vec![Rendition {
                kind: RenditionKind::Video,
                height: Some(480),
                bitrate: None,
                container: "mp4".to_string(),
                locator: "18".to_string(),
                direct_url: String::new(),
            }],
            audio: vec![Rendition {
                kind: RenditionKind::Audio,
                height: None,
                bitrate: Some(128.0),
                container: "m4a".to_string(),
                locator: "140".to_string(),
                direct_url: String::new(),
            }],
        }
    }

    #[async_trait]
    impl MediaExtractor for ScriptedExtractor {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn catalog(
            &self,
            reference: &MediaReference,
        ) -> Result<RenditionCatalog, ExtractorError> {
            if reference.video_id().starts_with('F') {
                return Err(ExtractorError::Failed {
                    cause: "scripted failure".to_string(),
                });
            }
            Ok(test_catalog(reference.video_id()))
        }

        async fn playlist(
            &self,
            _reference: &PlaylistReference,
        ) -> Result<PlaylistCatalog, ExtractorError> {
            unimplemented!("not used by archive tests")
        }

        async fn open_stream(
            &self,
            reference: &MediaReference,
            _rendition: &Rendition,
            _kind: RenditionKind,
        ) -> Result<MediaByteSource, ExtractorError> {
            let payload = Bytes::from(format!("payload-{}", reference.video_id()));
            Ok(MediaByteSource::from_stream(stream::iter(vec![Ok(payload)])))
        }
    }

    fn playlist_of(ids: &[&str]) -> PlaylistCatalog {
        PlaylistCatalog {
            title: "Mix".to_string(),
            thumbnail: String::new(),
            entries: ids
                .iter()
                .map(|id| PlaylistEntry {
                    video_id: (*id).to_string(),
                    title: format!("Track {id}"),
                    duration_seconds: 10,
                })
                .collect(),
        }
    }

    async fn collect_zip(archive: PlaylistArchive) -> Vec<String> {
        let mut source = archive.open_stream().await.expect("archive stream");
        let mut raw = Vec::new();
        while let Some(chunk) = source.next().await {
            raw.extend_from_slice(&chunk.expect("archive chunk"));
        }
        let reader = std::io::Cursor::new(raw);
        let zip = zip::ZipArchive::new(reader).expect("valid zip");
        zip.file_names().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_skips_members() {
        let extractor: Arc<dyn MediaExtractor> = Arc::new(ScriptedExtractor);
        let playlist = playlist_of(&[
            "AAAAAAAAAAA",
            "FAAAAAAAAAA",
            "BBBBBBBBBBB",
            "FBBBBBBBBBB",
            "CCCCCCCCCCC",
        ]);

        let archive = build_playlist_archive(
            &extractor,
            &playlist,
            RenditionKind::Audio,
            QualityTier::Low,
            10,
        )
        .await
        .expect("partial success");

        assert_eq!(archive.entry_count, 3);
        assert_eq!(archive.skipped, 2);

        let mut names = collect_zip(archive).await;
        names.sort();
        assert_eq!(
            names,
            vec![
                "01 - Track AAAAAAAAAAA.mp3",
                "03 - Track BBBBBBBBBBB.mp3",
                "05 - Track CCCCCCCCCCC.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn test_all_members_failing_is_batch_failure() {
        let extractor: Arc<dyn MediaExtractor> = Arc::new(ScriptedExtractor);
        let playlist = playlist_of(&["FAAAAAAAAAA", "FBBBBBBBBBB"]);

        let result = build_playlist_archive(
            &extractor,
            &playlist,
            RenditionKind::Video,
            QualityTier::Medium,
            10,
        )
        .await;

        assert!(matches!(
            result,
            Err(ProxyError::BatchDownloadFailed { attempted: 2 })
        ));
    }

    #[tokio::test]
    async fn test_member_cap_is_enforced() {
        let extractor: Arc<dyn MediaExtractor> = Arc::new(ScriptedExtractor);
        let playlist = playlist_of(&["AAAAAAAAAAA", "BBBBBBBBBBB", "CCCCCCCCCCC"]);

        let archive = build_playlist_archive(
            &extractor,
            &playlist,
            RenditionKind::Audio,
            QualityTier::Low,
            2,
        )
        .await
        .expect("capped batch");

        assert_eq!(archive.entry_count, 2);
    }
}
