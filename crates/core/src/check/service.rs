//! The check service: one object owning every per-process component.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::Stream;
use tracing::{debug, error, info, warn};

use super::error::{CheckError, ErrorClass};
use super::types::{CheckParams, CheckResponse};
use crate::artifacts::CheckedArtifactStore;
use crate::config::Config;
use crate::engine::{EngineJob, EngineOptions, OmrEngine};
use crate::evaluation::EvaluationConfigResolver;
use crate::metrics::{CHECKS_TOTAL, ENGINE_DURATION};
use crate::results::ResultExtractor;
use crate::template::{TemplateAssetCache, TemplateHandle, TemplateStore};
use crate::upload::{validate_filename, UploadIngestor};
use crate::workspace::{RequestContext, RequestWorkspace};

/// An opened check: validated template, live workspace, maybe an upload.
#[derive(Debug)]
pub struct CheckSession {
    ctx: RequestContext,
    template: TemplateHandle,
    original_filename: String,
    upload_name: String,
    uploaded_bytes: Option<u64>,
}

impl CheckSession {
    pub fn request_id(&self) -> &str {
        self.ctx.request_id()
    }

    /// Abandon the check and remove its workspace.
    pub async fn close(self) {
        self.ctx.close().await;
    }
}

/// Count one finished request in `omr_checks_total`; `None` means success.
pub fn record_outcome(class: Option<ErrorClass>) {
    let outcome = class.map_or("success", |c| c.as_str());
    CHECKS_TOTAL.with_label_values(&[outcome]).inc();
}

pub struct CheckService {
    templates: TemplateAssetCache,
    resolver: EvaluationConfigResolver,
    workspace: RequestWorkspace,
    ingestor: UploadIngestor,
    engine: Arc<dyn OmrEngine>,
    engine_options: EngineOptions,
    extractor: ResultExtractor,
    artifacts: CheckedArtifactStore,
}

impl CheckService {
    pub fn new(config: &Config, engine: Arc<dyn OmrEngine>) -> Self {
        Self {
            templates: TemplateAssetCache::new(TemplateStore::new(&config.paths.templates_dir)),
            resolver: EvaluationConfigResolver::new(),
            workspace: RequestWorkspace::new(config.paths.workspace_root()),
            ingestor: UploadIngestor::new(config.upload.max_bytes, config.upload.chunk_size),
            engine,
            engine_options: EngineOptions::from(&config.engine),
            extractor: ResultExtractor::new(),
            artifacts: CheckedArtifactStore::new(config.paths.checked_omr_dir()),
        }
    }

    pub fn template_cache(&self) -> &TemplateAssetCache {
        &self.templates
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.ingestor.max_bytes()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Validate the upload's filename and the template, then open a workspace.
    ///
    /// Nothing is created on disk when either check fails.
    pub async fn open_session(
        &self,
        template_id: &str,
        filename: Option<&str>,
    ) -> Result<CheckSession, CheckError> {
        let extension = validate_filename(filename)?;
        let template = self.templates.store().resolve(template_id).await?;
        let ctx = self.workspace.open().await?;

        Ok(CheckSession {
            ctx,
            template,
            original_filename: filename.unwrap_or_default().to_string(),
            upload_name: format!("upload.{}", extension),
            uploaded_bytes: None,
        })
    }

    /// Stream the image into the session's workspace.
    pub async fn ingest<S, E>(&self, session: &mut CheckSession, stream: S) -> Result<u64, CheckError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let destination = session.ctx.scans_dir().join(&session.upload_name);
        let written = self.ingestor.ingest(stream, &destination).await?;
        session.uploaded_bytes = Some(written);
        Ok(written)
    }

    /// Run the engine for an ingested session. Always removes the workspace.
    ///
    /// The outcome is not counted here; callers record it once per request
    /// with [`record_outcome`].
    pub async fn finish(
        &self,
        session: CheckSession,
        params: &CheckParams,
    ) -> Result<CheckResponse, CheckError> {
        let result = self.process(&session, params).await;
        session.close().await;
        result
    }

    /// Open, ingest and finish in one call, counting the outcome.
    pub async fn check<S, E>(
        &self,
        params: &CheckParams,
        filename: Option<&str>,
        stream: S,
    ) -> Result<CheckResponse, CheckError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let result = self.run_check(params, filename, stream).await;
        record_outcome(result.as_ref().err().map(CheckError::class));
        result
    }

    async fn run_check<S, E>(
        &self,
        params: &CheckParams,
        filename: Option<&str>,
        stream: S,
    ) -> Result<CheckResponse, CheckError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let mut session = self.open_session(&params.template_id, filename).await?;
        if let Err(e) = self.ingest(&mut session, stream).await {
            session.close().await;
            return Err(e);
        }
        self.finish(session, params).await
    }

    async fn process(
        &self,
        session: &CheckSession,
        params: &CheckParams,
    ) -> Result<CheckResponse, CheckError> {
        let ctx = &session.ctx;
        let request_id = ctx.request_id();

        // The template may have been named after the image in the form.
        let template = if params.template_id == session.template.id() {
            session.template.clone()
        } else {
            self.templates.store().resolve(&params.template_id).await?
        };

        let uploaded = session.uploaded_bytes.ok_or(CheckError::MissingImage)?;

        let resolved = self
            .resolver
            .resolve(&template, params.evaluate, params.evaluation.as_deref())
            .await?;

        let bundle = self.templates.get(template.id()).await?;
        bundle.stage(ctx.input_dir()).await?;
        debug!(
            request_id = %request_id,
            assets = ?bundle.names().collect::<Vec<_>>(),
            "Staged template assets"
        );
        resolved.materialize(ctx.input_dir()).await?;

        info!(
            request_id = %request_id,
            template_id = %template.id(),
            evaluation = %resolved.source(),
            upload_bytes = uploaded,
            "Running check"
        );

        let job = EngineJob {
            request_id: request_id.to_string(),
            input_dir: ctx.input_dir().to_path_buf(),
            output_dir: ctx.output_dir().to_path_buf(),
            options: self.engine_options,
        };
        let started = Instant::now();
        let run = self.engine.run(&job).await;
        let elapsed = started.elapsed().as_secs_f64();
        ENGINE_DURATION
            .with_label_values(&[if run.is_ok() { "ok" } else { "error" }])
            .observe(elapsed);
        if let Err(e) = run {
            error!(request_id = %request_id, engine = self.engine.name(), "OMR engine failed: {}", e);
            return Err(e.into());
        }

        let has_evaluation = resolved.is_active();
        let extraction = match self
            .extractor
            .extract(ctx.output_dir(), &session.upload_name, has_evaluation)
            .await
        {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(request_id = %request_id, "No result from engine: {}", e);
                return Err(e.into());
            }
        };
        let row = extraction.row;

        let artifact = match CheckedArtifactStore::engine_output(ctx.output_dir(), &row.file_id) {
            Some(source) => {
                self.artifacts
                    .persist(&source, &session.original_filename, request_id)
                    .await
            }
            None => None,
        };

        let (score, evaluation) = match row.score {
            Some(score) if has_evaluation => (Some(score), Some(extraction.evaluation)),
            _ => (None, None),
        };

        info!(
            request_id = %request_id,
            file_id = %row.file_id,
            fields = row.responses.len(),
            ?score,
            elapsed_secs = elapsed,
            "Check completed"
        );

        Ok(CheckResponse {
            request_id: request_id.to_string(),
            file_id: row.file_id,
            responses: row.responses,
            checked_omr_path: artifact.as_ref().map(|a| a.storage_path.clone()),
            checked_omr_filename: artifact.map(|a| a.retrieval_key),
            score,
            evaluation,
        })
    }
}
