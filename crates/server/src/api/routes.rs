use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{check, checked, handlers, middleware::metrics_middleware};
use crate::state::AppState;

/// Headroom over the image ceiling for the other form fields and boundaries.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.check_service().max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/check", post(check::check))
        // Checked sheets; the long form mirrors the on-disk layout
        .route("/checked/{*path}", get(checked::get_checked))
        .route("/outputs/scans/CheckedOMRs/{*path}", get(checked::get_checked))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
