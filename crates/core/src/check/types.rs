use serde::Serialize;
use serde_json::{Map, Value};

use crate::results::EvaluationDetailRow;
use crate::template::DEFAULT_TEMPLATE_ID;

/// Caller-controlled options of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckParams {
    pub template_id: String,
    /// Use the template's default scoring config when no `evaluation` is given.
    pub evaluate: bool,
    /// Caller-supplied scoring config as a JSON string.
    pub evaluation: Option<String>,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            template_id: DEFAULT_TEMPLATE_ID.to_string(),
            evaluate: true,
            evaluation: None,
        }
    }
}

/// Successful check result as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResponse {
    pub request_id: String,
    pub file_id: String,
    pub responses: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_omr_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_omr_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Vec<EvaluationDetailRow>>,
}
