//! Persisted checked sheets and their read path.
//!
//! Layout under the artifact root (`<outputs>/scans/CheckedOMRs`):
//!
//! ```text
//! 2025-02/<request_id>_<original_filename>
//! 2025-03/...
//! ```
//!
//! Files are only ever added; nothing here deletes them.

mod server;
mod store;

pub use server::{content_type_for, is_safe_request_path, SecureFileServer, ServeError, ServedFile};
pub use store::{
    month_partition, sanitize_filename, CheckedArtifact, CheckedArtifactStore, ENGINE_CHECKED_SUBDIR,
    STORAGE_PATH_PREFIX,
};
