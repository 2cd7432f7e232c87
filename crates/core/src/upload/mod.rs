//! Bounded, streaming ingestion of uploaded sheet images.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::metrics::UPLOAD_BYTES;

/// Accepted image extensions (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No filename")]
    MissingFilename,

    #[error("File must be .jpg, .jpeg or .png")]
    UnsupportedMediaType { filename: String },

    #[error("Image too large. Maximum size is {} MB.", max_bytes / (1024 * 1024))]
    PayloadTooLarge { max_bytes: u64 },

    /// The client stream failed mid-upload (disconnect, malformed body).
    #[error("Failed to read upload: {reason}")]
    StreamFailed { reason: String },

    #[error("Failed to write upload to {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Check the client-supplied filename and return its lowercase extension.
pub fn validate_filename(filename: Option<&str>) -> Result<String, UploadError> {
    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or(UploadError::MissingFilename)?;

    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()));

    extension.ok_or_else(|| UploadError::UnsupportedMediaType {
        filename: filename.to_string(),
    })
}

/// Streams uploads to disk under a byte ceiling.
#[derive(Debug, Clone)]
pub struct UploadIngestor {
    max_bytes: u64,
    chunk_size: usize,
}

impl UploadIngestor {
    pub fn new(max_bytes: u64, chunk_size: usize) -> Self {
        Self {
            max_bytes,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Copy `stream` into `destination`, returning the number of bytes written.
    ///
    /// Incoming data is regrouped into `chunk_size` writes. Nothing past the
    /// ceiling is ever written: the chunk that would cross it aborts the
    /// upload and the partial file is removed.
    pub async fn ingest<S, E>(&self, stream: S, destination: &Path) -> Result<u64, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let result = self.write_stream(stream, destination).await;
        match &result {
            Ok(total) => {
                UPLOAD_BYTES.observe(*total as f64);
                debug!(path = %destination.display(), bytes = total, "Upload ingested");
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(destination).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %destination.display(), "Failed to remove partial upload: {}", remove_err);
                    }
                }
                debug!(path = %destination.display(), "Upload aborted: {}", e);
            }
        }
        result
    }

    async fn write_stream<S, E>(&self, stream: S, destination: &Path) -> Result<u64, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let write_failed = |source: std::io::Error| UploadError::WriteFailed {
            path: destination.to_path_buf(),
            source,
        };

        let mut stream = std::pin::pin!(stream);
        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(write_failed)?;
        let mut buffer: Vec<u8> = Vec::with_capacity(self.chunk_size);
        let mut total: u64 = 0;

        while let Some(piece) = stream.next().await {
            let piece = piece.map_err(|e| UploadError::StreamFailed {
                reason: e.to_string(),
            })?;

            total += piece.len() as u64;
            if total > self.max_bytes {
                return Err(UploadError::PayloadTooLarge {
                    max_bytes: self.max_bytes,
                });
            }

            let mut rest = piece.as_ref();
            while !rest.is_empty() {
                let take = (self.chunk_size - buffer.len()).min(rest.len());
                buffer.extend_from_slice(&rest[..take]);
                rest = &rest[take..];
                if buffer.len() == self.chunk_size {
                    file.write_all(&buffer).await.map_err(write_failed)?;
                    buffer.clear();
                }
            }
        }

        if !buffer.is_empty() {
            file.write_all(&buffer).await.map_err(write_failed)?;
        }
        file.flush().await.map_err(write_failed)?;

        Ok(total)
    }
}
