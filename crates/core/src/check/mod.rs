//! End-to-end orchestration of a sheet check.
//!
//! A check runs in three steps so that HTTP handlers can stream multipart
//! bodies straight into the workspace:
//!
//! 1. [`CheckService::open_session`] validates the filename and template, then
//!    opens a request workspace.
//! 2. [`CheckService::ingest`] streams the image into the workspace.
//! 3. [`CheckService::finish`] stages template assets and the evaluation
//!    config, runs the engine, extracts results and persists the checked sheet.
//!    The workspace is removed before it returns, on success or failure.

mod error;
mod service;
mod types;

pub use error::{CheckError, ErrorClass};
pub use service::{record_outcome, CheckService, CheckSession};
pub use types::{CheckParams, CheckResponse};
