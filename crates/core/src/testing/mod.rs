//! Testing utilities: a scripted OMR engine and on-disk template fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use omr_gateway_core::testing::{MockEngine, MockSheet, TemplateFixture};
//!
//! let fixture = TemplateFixture::new(dir.path()).with_template("default", true);
//! let engine = Arc::new(MockEngine::recognizing(MockSheet::sample()));
//! let service = CheckService::new(&fixture.config(), engine.clone());
//!
//! // ... run checks ...
//!
//! let runs = engine.recorded_runs().await;
//! assert!(runs[0].had_evaluation);
//! ```

mod fixtures;
mod mock_engine;

pub use fixtures::TemplateFixture;
pub use mock_engine::{MockEngine, MockOutcome, MockSheet, RecordedRun};
