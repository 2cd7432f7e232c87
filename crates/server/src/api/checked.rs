//! Read path for persisted checked sheets.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::error::ApiError;
use crate::state::AppState;

/// `GET /checked/{*path}`, the retrieval key from a check response.
pub async fn get_checked(
    State(state): State<Arc<AppState>>,
    path: Result<Path<String>, PathRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    // Undecodable paths name nothing on disk.
    let Path(path) = path.map_err(|_| ApiError::not_found())?;
    let file = state.file_server().resolve(&path).await?;

    let mut response = match ServeFile::new(&file.path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(file.content_type));
    Ok(response.into_response())
}
