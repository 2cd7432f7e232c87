//! Engine implementation backed by an external command.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::EngineError;
use super::traits::OmrEngine;
use super::types::EngineJob;
use crate::config::EngineConfig;

/// Captured stderr is truncated to this many trailing bytes.
const STDERR_TAIL_BYTES: usize = 4096;

/// Runs the OMR engine as a child process per request.
///
/// The child is killed if the request future is dropped, so a disconnected
/// caller does not leave the engine running.
pub struct CommandEngine {
    config: EngineConfig,
}

impl CommandEngine {
    /// Creates a new command engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Creates an engine with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Builds the argument list for a job, substituting directory placeholders
    /// and appending option flags.
    fn build_args(&self, job: &EngineJob) -> Vec<String> {
        let input = path_arg(&job.input_dir);
        let output = path_arg(&job.output_dir);

        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input_dir}", &input)
                    .replace("{output_dir}", &output)
            })
            .collect();

        if job.options.set_layout {
            args.push("--setLayout".to_string());
        }
        if job.options.auto_align {
            args.push("--autoAlign".to_string());
        }

        args
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn stderr_tail(stderr: &[u8]) -> Option<String> {
    if stderr.is_empty() {
        return None;
    }
    let start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
    Some(String::from_utf8_lossy(&stderr[start..]).trim().to_string())
}

#[async_trait]
impl OmrEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    async fn run(&self, job: &EngineJob) -> Result<(), EngineError> {
        let args = self.build_args(job);
        debug!(
            request_id = %job.request_id,
            program = %self.config.program.display(),
            ?args,
            "Running OMR engine"
        );

        let mut command = Command::new(&self.config.program);
        command
            .args(&args)
            .env("OMR_DEBUG", if job.options.debug { "1" } else { "0" })
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound {
                    program: self.config.program.clone(),
                }
            } else {
                EngineError::SpawnFailed {
                    program: self.config.program.clone(),
                    source: e,
                }
            }
        })?;

        if !output.status.success() {
            let reason = match output.status.code() {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(EngineError::failed(reason, stderr_tail(&output.stderr)));
        }

        debug!(
            request_id = %job.request_id,
            stdout_bytes = output.stdout.len(),
            "OMR engine finished"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use std::path::PathBuf;

    fn job(options: EngineOptions) -> EngineJob {
        EngineJob {
            request_id: "req-1".to_string(),
            input_dir: PathBuf::from("/tmp/omr_req-1"),
            output_dir: PathBuf::from("/tmp/omr_out_req-1"),
            options,
        }
    }

    fn shell_engine(script: &str) -> CommandEngine {
        CommandEngine::new(EngineConfig {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), script.to_string()],
            ..Default::default()
        })
    }

    #[test]
    fn test_build_args_substitutes_placeholders() {
        let engine = CommandEngine::with_defaults();
        let args = engine.build_args(&job(EngineOptions::default()));
        assert_eq!(
            args,
            vec![
                "main.py",
                "--inputDir",
                "/tmp/omr_req-1",
                "--outputDir",
                "/tmp/omr_out_req-1"
            ]
        );
    }

    #[test]
    fn test_build_args_appends_flags() {
        let engine = CommandEngine::with_defaults();
        let args = engine.build_args(&job(EngineOptions {
            debug: true,
            set_layout: true,
            auto_align: true,
        }));
        assert!(args.ends_with(&["--setLayout".to_string(), "--autoAlign".to_string()]));
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = vec![b'x'; STDERR_TAIL_BYTES * 2];
        assert_eq!(stderr_tail(&long).unwrap().len(), STDERR_TAIL_BYTES);
        assert!(stderr_tail(b"").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_success() {
        let engine = shell_engine("exit 0");
        assert!(engine.run(&job(EngineOptions::default())).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_nonzero_exit_is_failure() {
        let engine = shell_engine("echo 'marker detection crashed' >&2; exit 3");
        let err = engine.run(&job(EngineOptions::default())).await.unwrap_err();
        match err {
            EngineError::Failed { reason, stderr } => {
                assert_eq!(reason, "exit code 3");
                assert_eq!(stderr.as_deref(), Some("marker detection crashed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let engine = CommandEngine::new(EngineConfig {
            program: PathBuf::from("/nonexistent/omr-engine"),
            ..Default::default()
        });
        let err = engine.run(&job(EngineOptions::default())).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
