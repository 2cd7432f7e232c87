//! Mock OMR engine for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{EngineError, EngineJob, OmrEngine};
use crate::template::{DESCRIPTOR_FILE, EVALUATION_FILE};
use crate::workspace::SCANS_DIR;

/// What the mock "recognizes" on every sheet.
#[derive(Debug, Clone)]
pub struct MockSheet {
    /// Response columns in table order.
    pub responses: Vec<(String, String)>,
    /// Score written when an evaluation config was staged.
    pub score: f64,
    /// Raw evaluation table written when an evaluation config was staged.
    pub evaluation_csv: String,
    /// Annotated image written under `CheckedOMRs`, if any.
    pub checked_image: Option<Vec<u8>>,
}

impl MockSheet {
    /// Two answered questions, both correct.
    pub fn sample() -> Self {
        Self {
            responses: vec![
                ("Roll".to_string(), "0042".to_string()),
                ("q1".to_string(), "A".to_string()),
                ("q2".to_string(), "C".to_string()),
            ],
            score: 2.0,
            evaluation_csv: "question,marked_answer,answer_item,verdict,delta,score\n\
                             q1,A,A,correct,1,1\n\
                             q2,C,C,correct,1,2\n"
                .to_string(),
            checked_image: Some(b"checked sheet".to_vec()),
        }
    }
}

/// Scripted result of a run.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Recognized(MockSheet),
    /// Header-only results table, as the engine writes when markers are missing.
    NoMarkers,
    Fail(String),
}

/// Snapshot of one engine invocation.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub request_id: String,
    /// Bytes of the staged template descriptor.
    pub descriptor: Option<Vec<u8>>,
    pub had_evaluation: bool,
    /// Bytes of the staged evaluation config.
    pub evaluation: Option<Vec<u8>>,
    /// Top-level entries of the input directory, sorted.
    pub input_files: Vec<String>,
    /// Entries of the input `scans` directory, sorted.
    pub scans: Vec<String>,
}

/// Mock implementation of the OmrEngine trait.
///
/// Reads back what was staged, records it, then writes output the way the
/// real engine lays it out.
#[derive(Debug)]
pub struct MockEngine {
    outcome: Arc<RwLock<MockOutcome>>,
    runs: Arc<RwLock<Vec<RecordedRun>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockEngine {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome: Arc::new(RwLock::new(outcome)),
            runs: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    pub fn recognizing(sheet: MockSheet) -> Self {
        Self::new(MockOutcome::Recognized(sheet))
    }

    pub fn no_markers() -> Self {
        Self::new(MockOutcome::NoMarkers)
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::new(MockOutcome::Fail(reason.into()))
    }

    pub async fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.write().await = outcome;
    }

    /// Sleep this long before producing output.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.runs.read().await.clone()
    }

    async fn record(&self, job: &EngineJob) -> RecordedRun {
        let evaluation = tokio::fs::read(job.input_dir.join(EVALUATION_FILE)).await.ok();
        let run = RecordedRun {
            request_id: job.request_id.clone(),
            descriptor: tokio::fs::read(job.input_dir.join(DESCRIPTOR_FILE)).await.ok(),
            had_evaluation: evaluation.is_some(),
            evaluation,
            input_files: list_dir(&job.input_dir).await,
            scans: list_dir(&job.input_dir.join(SCANS_DIR)).await,
        };
        self.runs.write().await.push(run.clone());
        run
    }
}

#[async_trait]
impl OmrEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, job: &EngineJob) -> Result<(), EngineError> {
        let run = self.record(job).await;

        if let Some(delay) = *self.delay.read().await {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome.read().await.clone();
        let upload = run.scans.first().cloned().unwrap_or_default();
        let out = &job.output_dir;

        match outcome {
            MockOutcome::Fail(reason) => Err(EngineError::failed(reason, None)),
            MockOutcome::NoMarkers => {
                write_results(out, &["file_id", "input_path", "output_path", "score"], &[])
                    .await
            }
            MockOutcome::Recognized(sheet) => {
                let score = if run.had_evaluation { sheet.score } else { 0.0 };
                let mut header = vec!["file_id", "input_path", "output_path", "score"];
                header.extend(sheet.responses.iter().map(|(k, _)| k.as_str()));
                let score = score.to_string();
                let mut row = vec![upload.as_str(), "in", "out", score.as_str()];
                row.extend(sheet.responses.iter().map(|(_, v)| v.as_str()));
                write_results(out, &header, &row).await?;

                if run.had_evaluation {
                    let stem = Path::new(&upload)
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_default();
                    let dir = out.join("scans/Evaluation");
                    write(&dir, &format!("{}_evaluation.csv", stem), sheet.evaluation_csv.as_bytes())
                        .await?;
                }
                if let Some(image) = &sheet.checked_image {
                    write(&out.join("scans/CheckedOMRs"), &upload, image).await?;
                }
                Ok(())
            }
        }
    }
}

async fn list_dir(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(mut entries) = tokio::fs::read_dir(dir).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    names
}

async fn write_results(out: &Path, header: &[&str], row: &[&str]) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_engine_error = |e: csv::Error| EngineError::failed(e.to_string(), None);
    writer.write_record(header).map_err(to_engine_error)?;
    if !row.is_empty() {
        writer.write_record(row).map_err(to_engine_error)?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| EngineError::failed(e.to_string(), None))?;
    write(&out.join("scans/Results"), "Results_12PM.csv", &data).await
}

async fn write(dir: &Path, name: &str, data: &[u8]) -> Result<(), EngineError> {
    let io_error = |e: std::io::Error| EngineError::failed(e.to_string(), None);
    tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
    tokio::fs::write(dir.join(name), data).await.map_err(io_error)
}
