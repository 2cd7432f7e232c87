//! Reads the results table and the optional evaluation table.

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use super::types::{EvaluationDetailRow, ExtractError, Extraction, ResultRow, RESERVED_COLUMNS};

/// Results tables, relative to the engine output directory.
pub const RESULTS_SUBDIR: &str = "scans/Results";
/// Evaluation tables, relative to the engine output directory.
pub const EVALUATION_SUBDIR: &str = "scans/Evaluation";

#[derive(Debug, Clone, Default)]
pub struct ResultExtractor;

impl ResultExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read the result of one engine run.
    ///
    /// `upload_name` is the file name the image was staged under; it is the
    /// fallback file id and keys the evaluation table.
    pub async fn extract(
        &self,
        output_dir: &Path,
        upload_name: &str,
        has_evaluation: bool,
    ) -> Result<Extraction, ExtractError> {
        let results_path = find_results_table(&output_dir.join(RESULTS_SUBDIR))
            .await?
            .ok_or(ExtractError::RecognitionFailed)?;

        let data = tokio::fs::read(&results_path)
            .await
            .map_err(|source| ExtractError::ReadFailed {
                path: results_path.clone(),
                source,
            })?;
        let row = parse_result_row(&data, upload_name).map_err(|e| match e {
            RowError::Empty => ExtractError::RecognitionFailed,
            RowError::Csv(reason) => ExtractError::Malformed {
                path: results_path.clone(),
                reason,
            },
        })?;

        let evaluation = if has_evaluation {
            self.load_evaluation(output_dir, upload_name).await
        } else {
            Vec::new()
        };

        Ok(Extraction { row, evaluation })
    }

    /// Best-effort: a missing or unreadable table yields an empty list.
    async fn load_evaluation(&self, output_dir: &Path, upload_name: &str) -> Vec<EvaluationDetailRow> {
        let stem = Path::new(upload_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| upload_name.to_string());
        let path = output_dir
            .join(EVALUATION_SUBDIR)
            .join(format!("{}_evaluation.csv", stem));

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), "No evaluation table: {}", e);
                return Vec::new();
            }
        };

        match parse_records(&data) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(path = %path.display(), "Ignoring unreadable evaluation table: {}", e);
                Vec::new()
            }
        }
    }
}

/// Picks the first `Results_*.csv` in name order.
async fn find_results_table(dir: &Path) -> Result<Option<PathBuf>, ExtractError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ExtractError::ReadFailed {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut tables = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => {
                return Err(ExtractError::ReadFailed {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with("Results_") && name.ends_with(".csv") {
            tables.push(entry.path());
        }
    }

    tables.sort();
    Ok(tables.into_iter().next())
}

#[derive(Debug)]
enum RowError {
    Empty,
    Csv(String),
}

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new().flexible(true).from_reader(data)
}

fn parse_result_row(data: &[u8], upload_name: &str) -> Result<ResultRow, RowError> {
    let mut reader = reader(data);
    let headers = reader
        .headers()
        .map_err(|e| RowError::Csv(e.to_string()))?
        .clone();
    let record = match reader.records().next() {
        Some(record) => record.map_err(|e| RowError::Csv(e.to_string()))?,
        None => return Err(RowError::Empty),
    };

    let cell = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .map(|i| record.get(i).unwrap_or("").to_string())
    };

    let file_id = cell("file_id")
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| upload_name.to_string());

    let score = cell("score").and_then(|raw| match raw.trim().parse::<f64>() {
        Ok(score) => Some(score),
        Err(_) => {
            warn!(value = %raw, "Score column is not numeric");
            None
        }
    });

    let mut responses = Map::new();
    for (i, header) in headers.iter().enumerate() {
        if RESERVED_COLUMNS.contains(&header) {
            continue;
        }
        let value = record.get(i).unwrap_or("");
        responses.insert(header.to_string(), Value::String(value.to_string()));
    }

    Ok(ResultRow {
        file_id,
        responses,
        score,
    })
}

fn parse_records(data: &[u8]) -> Result<Vec<EvaluationDetailRow>, csv::Error> {
    let mut reader = reader(data);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: EvaluationDetailRow = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (header.to_string(), infer_value(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Numbers become JSON numbers, blanks become null, everything else a string.
fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}
