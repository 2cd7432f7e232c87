//! Extraction of the engine's tabular output.

mod extractor;
mod types;

pub use extractor::{ResultExtractor, EVALUATION_SUBDIR, RESULTS_SUBDIR};
pub use types::{EvaluationDetailRow, ExtractError, Extraction, ResultRow, RESERVED_COLUMNS};
