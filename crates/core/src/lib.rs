pub mod artifacts;
pub mod check;
pub mod config;
pub mod engine;
pub mod evaluation;
pub mod metrics;
pub mod results;
pub mod template;
pub mod testing;
pub mod upload;
pub mod workspace;

pub use artifacts::{CheckedArtifact, CheckedArtifactStore, SecureFileServer, ServeError, ServedFile};
pub use check::{
    record_outcome, CheckError, CheckParams, CheckResponse, CheckService, CheckSession, ErrorClass,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, EngineConfig,
    PathsConfig, ServerConfig, UploadConfig,
};
pub use engine::{CommandEngine, EngineError, EngineJob, EngineOptions, OmrEngine};
pub use evaluation::{EvaluationConfigResolver, EvaluationError, EvaluationSource};
pub use results::{ExtractError, ResultExtractor, ResultRow};
pub use template::{TemplateAssetBundle, TemplateAssetCache, TemplateError, TemplateStore};
pub use upload::{UploadError, UploadIngestor};
pub use workspace::{RequestContext, RequestWorkspace, WorkspaceError};
