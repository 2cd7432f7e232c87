//! Error taxonomy of a check.

use thiserror::Error;

use crate::engine::EngineError;
use crate::evaluation::EvaluationError;
use crate::results::ExtractError;
use crate::template::TemplateError;
use crate::upload::UploadError;
use crate::workspace::WorkspaceError;

/// How a failure is reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    PayloadTooLarge,
    NotFound,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::PayloadTooLarge => "payload_too_large",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("No image provided")]
    MissingImage,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl CheckError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MissingImage => ErrorClass::BadRequest,
            Self::Template(TemplateError::NotFound { .. }) => ErrorClass::BadRequest,
            Self::Evaluation(EvaluationError::InvalidJson { .. })
            | Self::Evaluation(EvaluationError::InvalidConfig { .. }) => ErrorClass::BadRequest,
            Self::Upload(UploadError::PayloadTooLarge { .. }) => ErrorClass::PayloadTooLarge,
            Self::Upload(UploadError::WriteFailed { .. }) => ErrorClass::Internal,
            Self::Upload(_) => ErrorClass::BadRequest,
            Self::Extract(ExtractError::RecognitionFailed) => ErrorClass::BadRequest,
            _ => ErrorClass::Internal,
        }
    }

    /// Short machine-readable tag for the failure.
    ///
    /// Internal failures only distinguish engine faults from I/O faults.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MissingImage => "MissingImage",
            Self::Template(TemplateError::NotFound { .. }) => "TemplateNotFound",
            Self::Evaluation(EvaluationError::InvalidJson { .. }) => "InvalidEvaluationJson",
            Self::Evaluation(EvaluationError::InvalidConfig { .. }) => "InvalidEvaluationConfig",
            Self::Upload(UploadError::MissingFilename) => "MissingFilename",
            Self::Upload(UploadError::UnsupportedMediaType { .. }) => "UnsupportedMediaType",
            Self::Upload(UploadError::PayloadTooLarge { .. }) => "PayloadTooLarge",
            Self::Upload(UploadError::StreamFailed { .. }) => "UploadInterrupted",
            Self::Extract(ExtractError::RecognitionFailed) => "RecognitionFailed",
            Self::Engine(_) => "EngineError",
            _ => "IoError",
        }
    }
}
