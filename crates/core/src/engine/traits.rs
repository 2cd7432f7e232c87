//! Trait definitions for the engine boundary.

use async_trait::async_trait;

use super::error::EngineError;
use super::types::EngineJob;

/// An engine that turns a prepared workspace into result files.
///
/// Implementations must not block the async runtime: long-running work belongs
/// in a child process or on the blocking pool.
#[async_trait]
pub trait OmrEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Runs the engine to completion for one request.
    async fn run(&self, job: &EngineJob) -> Result<(), EngineError>;
}
