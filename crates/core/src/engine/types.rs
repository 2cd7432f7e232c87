//! Types passed to the engine.

use std::path::PathBuf;

use crate::config::EngineConfig;

/// Engine switches forwarded on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    /// Keep annotated output images.
    pub debug: bool,
    /// Interactive layout mode; never useful for a server, kept for parity.
    pub set_layout: bool,
    pub auto_align: bool,
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            debug: config.debug,
            set_layout: config.set_layout,
            auto_align: config.auto_align,
        }
    }
}

/// One engine run against a request workspace.
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub request_id: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub options: EngineOptions,
}
