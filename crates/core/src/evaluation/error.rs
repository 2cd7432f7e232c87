//! Error types for evaluation config resolution.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The caller's document is not JSON.
    #[error("Invalid evaluation JSON: {reason}")]
    InvalidJson { reason: String },

    /// The caller's document is JSON but violates the evaluation schema.
    #[error("Evaluation config invalid: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to read evaluation config: {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write evaluation config: {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
