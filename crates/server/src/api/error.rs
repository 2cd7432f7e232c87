//! The single boundary where errors become HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use omr_gateway_core::{CheckError, ErrorClass, ServeError};

/// Detail reported for internal failures; the real cause only goes to the log.
const INTERNAL_DETAIL: &str = "Internal error while processing the sheet";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
    error_type: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>, error_type: &'static str) -> Self {
        Self {
            status,
            detail: detail.into(),
            error_type,
        }
    }

    pub fn bad_request(detail: impl Into<String>, error_type: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail, error_type)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not found", "NotFound")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Outcome label for `omr_checks_total`.
    pub fn class(&self) -> ErrorClass {
        match self.status {
            StatusCode::BAD_REQUEST => ErrorClass::BadRequest,
            StatusCode::PAYLOAD_TOO_LARGE => ErrorClass::PayloadTooLarge,
            StatusCode::NOT_FOUND => ErrorClass::NotFound,
            _ => ErrorClass::Internal,
        }
    }
}

fn status_for(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
        ErrorClass::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CheckError> for ApiError {
    fn from(err: CheckError) -> Self {
        let class = err.class();
        let detail = if class == ErrorClass::Internal {
            error!(error_type = err.type_name(), "Check failed: {:?}", err);
            INTERNAL_DETAIL.to_string()
        } else {
            err.to_string()
        };
        Self::new(status_for(class), detail, err.type_name())
    }
}

impl From<ServeError> for ApiError {
    fn from(err: ServeError) -> Self {
        match err {
            ServeError::NotFound => Self::not_found(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                detail: self.detail,
                error_type: self.error_type.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omr_gateway_core::{EngineError, ExtractError, TemplateError, UploadError};

    #[test]
    fn test_internal_errors_hide_detail() {
        let err: ApiError = CheckError::from(EngineError::failed(
            "exit code 1",
            Some("Traceback: /srv/secret/path.py".to_string()),
        ))
        .into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), INTERNAL_DETAIL);
        assert!(!err.detail().contains("secret"));
    }

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = CheckError::from(TemplateError::not_found("x")).into();
        assert_eq!(not_found.status(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found.detail(), "Template 'x' not found");

        let too_large: ApiError =
            CheckError::from(UploadError::PayloadTooLarge { max_bytes: 20 * 1024 * 1024 }).into();
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let no_markers: ApiError = CheckError::from(ExtractError::RecognitionFailed).into();
        assert_eq!(no_markers.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = ServeError::NotFound.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_class_follows_status() {
        let too_large: ApiError =
            CheckError::from(UploadError::PayloadTooLarge { max_bytes: 10 }).into();
        assert_eq!(too_large.class(), ErrorClass::PayloadTooLarge);
        assert_eq!(
            ApiError::bad_request("bad", "InvalidMultipart").class(),
            ErrorClass::BadRequest
        );
        assert_eq!(ApiError::not_found().class(), ErrorClass::NotFound);

        let engine: ApiError = CheckError::from(EngineError::failed("exit code 2", None)).into();
        assert_eq!(engine.class(), ErrorClass::Internal);
    }
}
