use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Filesystem locations used by the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory holding one sub-directory per template id.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    /// Root for persisted outputs; checked sheets land under `scans/CheckedOMRs`.
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: PathBuf,
    /// Root for per-request workspaces. Falls back to the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            outputs_dir: default_outputs_dir(),
            temp_dir: None,
        }
    }
}

impl PathsConfig {
    /// Directory the checked artifacts are persisted into and served from.
    pub fn checked_omr_dir(&self) -> PathBuf {
        self.outputs_dir.join("scans").join("CheckedOMRs")
    }

    /// Effective workspace root.
    pub fn workspace_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_outputs_dir() -> PathBuf {
    PathBuf::from("outputs")
}

/// Upload ingestion limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum accepted image size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Size of the chunks written to disk while streaming.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024 // 20 MiB
}

fn default_chunk_size() -> usize {
    256 * 1024 // 256 KiB
}

/// External OMR engine invocation.
///
/// `args` may contain the `{input_dir}` and `{output_dir}` placeholders, which
/// are substituted per request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_program")]
    pub program: PathBuf,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Working directory for the engine process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Ask the engine to keep its annotated (checked) images.
    #[serde(default = "default_true")]
    pub debug: bool,
    #[serde(default)]
    pub set_layout: bool,
    #[serde(default)]
    pub auto_align: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            working_dir: None,
            debug: true,
            set_layout: false,
            auto_align: false,
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("python3")
}

fn default_args() -> Vec<String> {
    ["main.py", "--inputDir", "{input_dir}", "--outputDir", "{output_dir}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}
