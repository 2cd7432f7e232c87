//! Request-scoped workspaces.
//!
//! Every check request gets its own engine input directory and engine output
//! directory under the workspace root:
//!
//! ```text
//! <root>/omr_<request_id>/          template assets, evaluation.json
//! <root>/omr_<request_id>/scans/    the uploaded image
//! <root>/omr_out_<request_id>/      everything the engine produces
//! ```
//!
//! Both directories are removed when the [`RequestContext`] is closed or
//! dropped, whichever comes first.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Sub-directory of the input directory holding the uploaded image.
pub const SCANS_DIR: &str = "scans";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Failed to create workspace directory: {path}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Creates request contexts under a root directory.
#[derive(Debug, Clone)]
pub struct RequestWorkspace {
    root: PathBuf,
}

impl RequestWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directories for a fresh request id.
    pub async fn open(&self) -> Result<RequestContext, WorkspaceError> {
        let request_id = Uuid::new_v4().to_string();
        let ctx = RequestContext {
            input_dir: self.root.join(format!("omr_{request_id}")),
            output_dir: self.root.join(format!("omr_out_{request_id}")),
            request_id,
            released: false,
        };

        // A failure here drops `ctx`, which removes whatever was created.
        for dir in [ctx.scans_dir(), ctx.output_dir.clone()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| WorkspaceError::CreateFailed { path: dir, source })?;
        }

        debug!(request_id = %ctx.request_id, "Opened request workspace");
        Ok(ctx)
    }
}

/// Exclusive per-request staging area.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    input_dir: PathBuf,
    output_dir: PathBuf,
    released: bool,
}

impl RequestContext {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn scans_dir(&self) -> PathBuf {
        self.input_dir.join(SCANS_DIR)
    }

    /// Remove both directories. Failures are logged, never returned.
    pub async fn close(mut self) {
        for dir in [&self.input_dir, &self.output_dir] {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(request_id = %self.request_id, path = %dir.display(), "Failed to remove workspace: {}", e),
            }
        }
        self.released = true;
        debug!(request_id = %self.request_id, "Closed request workspace");
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let request_id = std::mem::take(&mut self.request_id);
        let dirs = [
            std::mem::take(&mut self.input_dir),
            std::mem::take(&mut self.output_dir),
        ];
        // Cancelled requests drop on a runtime worker; keep the removal off it.
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_dirs_blocking(&request_id, &dirs));
            }
            Err(_) => remove_dirs_blocking(&request_id, &dirs),
        }
    }
}

fn remove_dirs_blocking(request_id: &str, dirs: &[PathBuf]) {
    for dir in dirs {
        if let Err(e) = std::fs::remove_dir_all(dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(request_id = %request_id, path = %dir.display(), "Failed to remove workspace: {}", e);
            }
        }
    }
    debug!(request_id = %request_id, "Dropped request workspace");
}
