//! `POST /check`: stream a multipart upload through the check service.

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use omr_gateway_core::{
    record_outcome, CheckError, CheckParams, CheckResponse, CheckService, CheckSession,
};

use super::error::ApiError;
use crate::state::AppState;

/// Options that may also be passed on the query string. Form fields win.
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub template_id: Option<String>,
    pub evaluate: Option<String>,
}

pub async fn check(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CheckQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CheckResponse>, ApiError> {
    let result = run_check(state.check_service(), query, multipart).await;
    record_outcome(result.as_ref().err().map(ApiError::class));
    result.map(Json)
}

async fn run_check(
    service: &CheckService,
    query: Result<Query<CheckQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CheckResponse, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text(), "InvalidRequest"))?;
    let multipart =
        multipart.map_err(|e| ApiError::bad_request(e.body_text(), "InvalidRequest"))?;

    let mut params = CheckParams::default();
    if let Some(template_id) = query.template_id.filter(|s| !s.is_empty()) {
        params.template_id = template_id;
    }
    if let Some(raw) = query.evaluate.as_deref() {
        params.evaluate = parse_bool(raw)?;
    }

    let mut session: Option<CheckSession> = None;
    if let Err(e) = read_form(service, multipart, &mut params, &mut session).await {
        if let Some(session) = session {
            session.close().await;
        }
        return Err(e);
    }

    let session = session.ok_or(CheckError::MissingImage)?;
    Ok(service.finish(session, &params).await?)
}

/// Consume the form, opening a session as soon as the image arrives.
async fn read_form(
    service: &CheckService,
    mut multipart: Multipart,
    params: &mut CheckParams,
    session: &mut Option<CheckSession>,
) -> Result<(), ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(()),
            Err(e) => return Err(multipart_error(e)),
        };
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                if session.is_some() {
                    debug!("Ignoring extra image field");
                    continue;
                }
                let filename = field.file_name().map(str::to_string);
                let opened = service
                    .open_session(&params.template_id, filename.as_deref())
                    .await?;
                let opened = session.insert(opened);
                service.ingest(opened, field).await?;
            }
            "template_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                if !text.is_empty() {
                    params.template_id = text;
                }
            }
            "evaluate" => {
                let text = field.text().await.map_err(multipart_error)?;
                params.evaluate = parse_bool(&text)?;
            }
            "evaluation" => {
                let text = field.text().await.map_err(multipart_error)?;
                params.evaluation = Some(text);
            }
            _ => {}
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, err.body_text(), "PayloadTooLarge")
    } else {
        ApiError::bad_request(err.body_text(), "InvalidMultipart")
    }
}

/// Form-style booleans.
fn parse_bool(raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::bad_request(
            format!("Invalid boolean for 'evaluate': {}", raw),
            "InvalidParameter",
        )),
    }
}
