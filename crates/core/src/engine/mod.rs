//! Boundary to the external OMR engine.
//!
//! The engine reads a prepared input directory (template assets, optional
//! `evaluation.json`, the image under `scans/`) and writes its results under an
//! output directory:
//!
//! ```text
//! <output>/scans/Results/Results_<timestamp>.csv
//! <output>/scans/Evaluation/<upload_stem>_evaluation.csv   (when scoring)
//! <output>/scans/CheckedOMRs/<file_id>                      (annotated image)
//! ```
//!
//! Nothing else about the engine is assumed.

mod command;
mod error;
mod traits;
mod types;

pub use command::CommandEngine;
pub use error::EngineError;
pub use traits::OmrEngine;
pub use types::{EngineJob, EngineOptions};
