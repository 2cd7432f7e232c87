//! Error types for the engine boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the OMR engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine executable not found.
    #[error("OMR engine not found at path: {program}")]
    NotFound { program: PathBuf },

    /// The engine process could not be started.
    #[error("Failed to start OMR engine {program}")]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and reported failure.
    #[error("OMR engine failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },
}

impl EngineError {
    /// Creates an engine failure with optional captured stderr.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }
}
