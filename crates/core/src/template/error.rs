//! Error types for the template module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or loading templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template directory or no descriptor for the id.
    #[error("Template '{template_id}' not found")]
    NotFound { template_id: String },

    /// An asset exists but could not be read.
    #[error("Failed to read template asset: {path}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing cached assets into a workspace failed.
    #[error("Failed to stage template asset into {path}")]
    StageFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TemplateError {
    pub fn not_found(template_id: impl Into<String>) -> Self {
        Self::NotFound {
            template_id: template_id.into(),
        }
    }
}
