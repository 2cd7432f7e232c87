use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Bookkeeping columns that are not part of the response map.
pub const RESERVED_COLUMNS: [&str; 4] = ["file_id", "input_path", "output_path", "score"];

/// The single result row of a check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub file_id: String,
    /// Response fields in the column order of the results table.
    pub responses: Map<String, Value>,
    pub score: Option<f64>,
}

/// Per-question evaluation record, keyed by the engine's column names.
pub type EvaluationDetailRow = Map<String, Value>;

/// Everything read back from one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub row: ResultRow,
    pub evaluation: Vec<EvaluationDetailRow>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The engine produced no result row, which is how it reports that the
    /// corner markers were not all found.
    #[error("Not a valid OMR sheet: marker(s) not found in one or more corners. All four corner markers must be visible. Please upload a clear OMR answer sheet.")]
    RecognitionFailed,

    #[error("Failed to read engine output: {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed engine output {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
