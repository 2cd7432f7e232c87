//! Path-safe lookup of persisted artifacts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServeError {
    #[error("Not found")]
    NotFound,
}

/// A file cleared for serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    /// Canonical path inside the artifact root.
    pub path: PathBuf,
    pub content_type: &'static str,
}

/// Content type by extension; anything unknown is opaque binary.
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Cheap syntactic screen applied before any filesystem access.
pub fn is_safe_request_path(relative: &str) -> bool {
    !relative.contains("..") && !relative.contains('\\') && !relative.contains('\0')
}

/// Serves files only from inside one root directory.
pub struct SecureFileServer {
    root: PathBuf,
    lookups: AtomicU64,
}

impl SecureFileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lookups: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem lookups performed so far.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Resolve a caller-supplied relative path to a servable file.
    ///
    /// The canonical target must lie inside the canonical root, which also
    /// rules out symlinks pointing elsewhere.
    pub async fn resolve(&self, relative: &str) -> Result<ServedFile, ServeError> {
        if !is_safe_request_path(relative) {
            debug!(path = %relative, "Rejected artifact path");
            return Err(ServeError::NotFound);
        }
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return Err(ServeError::NotFound);
        }

        self.lookups.fetch_add(1, Ordering::Relaxed);
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| ServeError::NotFound)?;
        let full = tokio::fs::canonicalize(root.join(relative))
            .await
            .map_err(|_| ServeError::NotFound)?;

        if !full.starts_with(&root) {
            debug!(path = %relative, "Artifact path escapes root");
            return Err(ServeError::NotFound);
        }

        let is_file = tokio::fs::metadata(&full)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(ServeError::NotFound);
        }

        Ok(ServedFile {
            content_type: content_type_for(&full),
            path: full,
        })
    }
}
