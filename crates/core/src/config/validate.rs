use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Upload ceiling and chunk size are non-zero
/// - Engine program is set
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.upload.max_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_bytes cannot be 0".to_string(),
        ));
    }

    if config.upload.chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "upload.chunk_size cannot be 0".to_string(),
        ));
    }

    if config.engine.program.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.program cannot be empty".to_string(),
        ));
    }

    Ok(())
}
