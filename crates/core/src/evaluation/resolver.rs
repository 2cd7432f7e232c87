//! Per-request evaluation config selection.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::error::EvaluationError;
use super::schema::validate_evaluation;
use crate::template::{TemplateHandle, EVALUATION_FILE};

/// Where the evaluation config for a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
    /// Supplied by the caller in the request body.
    Request,
    /// The template's default `evaluation.json`.
    Template,
    /// No evaluation applies.
    None,
}

impl EvaluationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Template => "template",
            Self::None => "none",
        }
    }
}

impl fmt::Display for EvaluationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An evaluation document ready to be written into a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationConfig {
    contents: Vec<u8>,
}

impl EvaluationConfig {
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

/// Outcome of resolution: the chosen config (if any) and its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvaluation {
    config: Option<EvaluationConfig>,
    source: EvaluationSource,
}

impl ResolvedEvaluation {
    fn none() -> Self {
        Self {
            config: None,
            source: EvaluationSource::None,
        }
    }

    pub fn config(&self) -> Option<&EvaluationConfig> {
        self.config.as_ref()
    }

    pub fn source(&self) -> EvaluationSource {
        self.source
    }

    pub fn is_active(&self) -> bool {
        self.config.is_some()
    }

    /// Write the chosen config as `evaluation.json` into `dir`.
    ///
    /// Returns the written path, or `None` when no evaluation applies.
    pub async fn materialize(&self, dir: &Path) -> Result<Option<PathBuf>, EvaluationError> {
        let Some(config) = &self.config else {
            return Ok(None);
        };
        let path = dir.join(EVALUATION_FILE);
        tokio::fs::write(&path, &config.contents)
            .await
            .map_err(|source| EvaluationError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        Ok(Some(path))
    }
}

/// Decides which scoring config governs a request.
#[derive(Debug, Clone, Default)]
pub struct EvaluationConfigResolver;

impl EvaluationConfigResolver {
    pub fn new() -> Self {
        Self
    }

    pub async fn resolve(
        &self,
        template: &TemplateHandle,
        evaluate: bool,
        caller_json: Option<&str>,
    ) -> Result<ResolvedEvaluation, EvaluationError> {
        if let Some(raw) = caller_json.map(str::trim).filter(|s| !s.is_empty()) {
            let document: Value =
                serde_json::from_str(raw).map_err(|e| EvaluationError::InvalidJson {
                    reason: e.to_string(),
                })?;
            validate_evaluation(&document)?;

            info!(
                template_id = %template.id(),
                questions_in_order = ?questions_preview(&document),
                "Using evaluation config from request"
            );
            let contents = serde_json::to_vec(&document).map_err(|e| {
                EvaluationError::InvalidJson {
                    reason: e.to_string(),
                }
            })?;
            return Ok(ResolvedEvaluation {
                config: Some(EvaluationConfig { contents }),
                source: EvaluationSource::Request,
            });
        }

        if !evaluate {
            info!(template_id = %template.id(), "Evaluation disabled for request");
            return Ok(ResolvedEvaluation::none());
        }

        let path = template.evaluation_path();
        match tokio::fs::read(&path).await {
            Ok(contents) => {
                info!(template_id = %template.id(), "Using template evaluation config");
                Ok(ResolvedEvaluation {
                    config: Some(EvaluationConfig { contents }),
                    source: EvaluationSource::Template,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    template_id = %template.id(),
                    "Evaluation requested but template has no evaluation config"
                );
                Ok(ResolvedEvaluation::none())
            }
            Err(source) => Err(EvaluationError::ReadFailed { path, source }),
        }
    }
}

fn questions_preview(document: &Value) -> Vec<&str> {
    document
        .pointer("/options/questions_in_order")
        .and_then(Value::as_array)
        .map(|qs| qs.iter().take(3).filter_map(Value::as_str).collect())
        .unwrap_or_default()
}
