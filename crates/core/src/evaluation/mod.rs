//! Selection and materialization of the scoring (evaluation) config.
//!
//! Exactly one provenance governs a request, in this order:
//! 1. a non-blank JSON document supplied by the caller,
//! 2. the template's `evaluation.json` when evaluation is requested,
//! 3. nothing.

mod error;
mod resolver;
mod schema;

pub use error::EvaluationError;
pub use resolver::{EvaluationConfig, EvaluationConfigResolver, EvaluationSource, ResolvedEvaluation};
pub use schema::validate_evaluation;
