//! Month-partitioned storage of annotated sheets.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tracing::{info, warn};

use crate::metrics::ARTIFACTS_PERSISTED;

/// Annotated images, relative to the engine output directory.
pub const ENGINE_CHECKED_SUBDIR: &str = "scans/CheckedOMRs";

/// Prefix of the storage path reported for a persisted sheet. It is also the
/// long-form public route, so `<prefix>/<retrieval_key>` is servable as is.
pub const STORAGE_PATH_PREFIX: &str = "outputs/scans/CheckedOMRs";

/// A persisted checked sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedArtifact {
    /// Relative bookkeeping path, `outputs/scans/CheckedOMRs/<month>/<name>`.
    pub storage_path: String,
    /// Key accepted by the read endpoints, `<month>/<name>`.
    pub retrieval_key: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// `YYYY-MM` partition for a point in time.
pub fn month_partition<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y-%m").to_string()
}

/// Reduce a client filename to a safe base name.
pub fn sanitize_filename(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

pub struct CheckedArtifactStore {
    root: PathBuf,
}

impl CheckedArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where the engine leaves the annotated image for `file_id`.
    pub fn engine_output(output_dir: &Path, file_id: &str) -> Option<PathBuf> {
        let name = Path::new(file_id).file_name()?;
        Some(output_dir.join(ENGINE_CHECKED_SUBDIR).join(name))
    }

    /// Copy the annotated image into this month's partition.
    ///
    /// Returns `None` when there is nothing to persist or the copy failed;
    /// neither fails the request.
    pub async fn persist(
        &self,
        source: &Path,
        original_filename: &str,
        request_id: &str,
    ) -> Option<CheckedArtifact> {
        self.persist_in(source, original_filename, request_id, &month_partition(&Local::now()))
            .await
    }

    pub(crate) async fn persist_in(
        &self,
        source: &Path,
        original_filename: &str,
        request_id: &str,
        month: &str,
    ) -> Option<CheckedArtifact> {
        if !tokio::fs::metadata(source)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return None;
        }

        let dir = self.root.join(month);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            warn!(request_id = %request_id, path = %dir.display(), "Failed to create artifact partition: {}", e);
            return None;
        }

        let name = format!("{}_{}", request_id, sanitize_filename(original_filename));
        let destination = dir.join(&name);
        if let Err(e) = tokio::fs::copy(source, &destination).await {
            warn!(request_id = %request_id, path = %destination.display(), "Failed to persist checked sheet: {}", e);
            return None;
        }

        ARTIFACTS_PERSISTED.inc();
        info!(request_id = %request_id, path = %destination.display(), "Persisted checked sheet");

        let retrieval_key = format!("{}/{}", month, name);
        Some(CheckedArtifact {
            storage_path: format!("{}/{}", STORAGE_PATH_PREFIX, retrieval_key),
            retrieval_key,
            path: destination,
        })
    }
}
