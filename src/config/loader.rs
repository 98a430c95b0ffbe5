//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ClientSettings;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::TransportError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate settings from TOML text.
pub fn parse_config(content: &str) -> Result<ClientSettings, ConfigError> {
    let settings: ClientSettings = toml::from_str(content)?;
    validate_config(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Load and validate settings from a TOML file.
pub fn load_config(path: &Path) -> Result<ClientSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings = parse_config(&content)?;
    tracing::debug!(path = %path.display(), endpoint = %settings.endpoint, "Configuration loaded");
    Ok(settings)
}
