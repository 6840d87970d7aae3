//! Configuration loading from files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{ConfigError, Result};

use super::StageConfig;

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or fails validation.
///
/// # Example
///
/// ```rust,ignore
/// use microscope_stage::load_config;
///
/// let config = load_config("/etc/microscope/stage.toml")?;
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StageConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let config = parse_config(&content)?;
    info!(path = %path.display(), samples = config.samples.len(), "Loaded stage configuration");
    Ok(config)
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or fails validation.
pub fn parse_config(content: &str) -> Result<StageConfig> {
    let config: StageConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.message().to_string()))?;

    // Validate the configuration
    super::validation::validate_config(&config)?;

    Ok(config)
}
