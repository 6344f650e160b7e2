//! Byte-stream proxying from extractor sources to HTTP responses.
//!
//! This module relays bytes from a subprocess stdout or an upstream HTTP
//! connection to the client without buffering the whole payload. Framing
//! headers are set exactly once before the first byte; a source failure
//! after that point can only truncate the connection, which is logged
//! server-side. Dropping a session kills the underlying subprocess or
//! closes the upstream connection, so an abandoned request never leaks
//! an extractor process.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt, future, stream};
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::catalog::RenditionKind;

/// Chunk size for subprocess stdout reads.
///
/// Balances relay latency against syscall overhead; the whole payload is
/// never resident at once.
const CHUNK_SIZE: usize = 64 * 1024;

/// Errors produced while opening or relaying a byte stream.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Failed to open byte source: {cause}")]
    SourceOpenFailed { cause: String },

    #[error("Stream aborted after {bytes_relayed} bytes: {cause}")]
    StreamAborted { bytes_relayed: u64, cause: String },

    #[error("All {attempted} playlist members failed to download")]
    BatchDownloadFailed { attempted: usize },

    #[error("Archive error: {0}")]
    Archive(#[from] io::Error),
}

/// A live byte source: subprocess stdout or an upstream HTTP body.
///
/// The source owns whatever handle produces the bytes. For subprocesses the
/// child is spawned with kill-on-drop, so dropping the source terminates
/// the extractor.
pub struct MediaByteSource {
    stream: BoxStream<'static, io::Result<Bytes>>,
}

impl MediaByteSource {
    /// Wraps a spawned extractor child whose stdout carries the media.
    ///
    /// The stream owns the child for as long as it is being drained; the
    /// child is spawned with kill-on-drop, so an abandoned session (client
    /// disconnect) terminates the extractor instead of leaking it.
    ///
    /// # Errors
    ///
    /// - `ProxyError::SourceOpenFailed` - If the child has no captured stdout
    pub fn from_child(mut child: Child) -> Result<Self, ProxyError> {
        let stdout = child.stdout.take().ok_or(ProxyError::SourceOpenFailed {
            cause: "extractor child has no captured stdout".to_string(),
        })?;
        let mut stderr = child.stderr.take();

        let media = ReaderStream::with_capacity(stdout, CHUNK_SIZE);

        // Stdout EOF alone does not mean success: an extractor that fails
        // right after spawn closes stdout without writing a byte. Reap the
        // child once the pipe closes and turn a non-zero exit into a
        // stream error carrying its stderr.
        let reap = stream::once(async move {
            let detail = match stderr.as_mut() {
                Some(pipe) => {
                    let mut raw = Vec::new();
                    let _ = pipe.read_to_end(&mut raw).await;
                    String::from_utf8_lossy(&raw).trim().to_string()
                }
                None => String::new(),
            };
            match child.wait().await {
                Ok(status) if status.success() => None,
                Ok(status) => Some(Err(io::Error::other(format!(
                    "extractor exit status {:?}: {detail}",
                    status.code()
                )))),
                Err(e) => Some(Err(e)),
            }
        })
        .filter_map(future::ready);

        Ok(Self {
            stream: media.chain(reap).boxed(),
        })
    }

    /// Wraps an upstream HTTP response body.
    pub fn from_http(response: reqwest::Response) -> Self {
        Self {
            stream: response
                .bytes_stream()
                .map(|chunk| chunk.map_err(io::Error::other))
                .boxed(),
        }
    }

    /// Wraps an arbitrary chunk stream. Used by tests and the archive path.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
        }
    }
}

impl Stream for MediaByteSource {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.as_mut().poll_next(cx)
    }
}

/// The live relay state for one request.
///
/// Owned solely by the response body for the duration of the request.
/// Tracks bytes relayed and a terminal flag; once terminal, the session
/// yields nothing further. Mid-stream source failures are logged here
/// because headers are already committed and the status cannot change.
pub struct StreamSession {
    source: BoxStream<'static, io::Result<Bytes>>,
    bytes_relayed: u64,
    terminal: bool,
}

impl StreamSession {
    pub fn new(source: MediaByteSource) -> Self {
        Self {
            source: source.stream,
            bytes_relayed: 0,
            terminal: false,
        }
    }
}

impl Stream for StreamSession {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let session = self.get_mut();
        if session.terminal {
            return Poll::Ready(None);
        }

        match session.source.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(chunk))) => {
                session.bytes_relayed += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                session.terminal = true;
                warn!(
                    bytes_relayed = session.bytes_relayed,
                    "Stream aborted mid-transfer: {e}"
                );
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                session.terminal = true;
                debug!(
                    bytes_relayed = session.bytes_relayed,
                    "Stream relay complete"
                );
                Poll::Ready(None)
            }
        }
    }
}

/// Response Content-Type for a single-item download.
pub fn content_type(kind: RenditionKind) -> &'static str {
    match kind {
        RenditionKind::Video => "video/mp4",
        RenditionKind::Audio => "audio/mpeg",
    }
}

/// Response Content-Type for a multi-item archive download.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Download filename extension for a single-item download.
pub fn file_extension(kind: RenditionKind) -> &'static str {
    match kind {
        RenditionKind::Video => "mp4",
        RenditionKind::Audio => "mp3",
    }
}

/// Strips everything outside a safe alphanumeric/space set from a title.
///
/// The result is usable inside a quoted Content-Disposition filename and
/// as an archive member name.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds the streaming attachment response for a single-item download.
///
/// Framing headers are set exactly once, before any byte is relayed.
pub fn attachment_response(
    source: MediaByteSource,
    title: &str,
    kind: RenditionKind,
) -> Response<Body> {
    let filename = format!("{}.{}", sanitize_filename(title), file_extension(kind));
    let disposition = format!("attachment; filename=\"{filename}\"");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type(kind))
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
        )
        .body(Body::from_stream(StreamSession::new(source)))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .expect("static response")
        })
}

/// Builds the streaming attachment response for a playlist archive.
pub fn archive_response(source: MediaByteSource, title: &str) -> Response<Body> {
    let filename = format!("{}.zip", sanitize_filename(title));
    let disposition = format!("attachment; filename=\"{filename}\"");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
        )
        .body(Body::from_stream(StreamSession::new(source)))
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .expect("static response")
        })
}
