//! Match configuration loading from RON files.

use std::path::{Path, PathBuf};

use linewars_core::data::MatchConfig;
use linewars_core::error::GameError;
use thiserror::Error;

/// Failure loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but did not parse or validate.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Load and validate a match configuration from a RON file.
pub fn load_config(path: &Path) -> Result<MatchConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = MatchConfig::from_ron_str(&text)?;
    tracing::info!(
        path = %path.display(),
        units = config.units.len(),
        buildings = config.buildings.len(),
        "Loaded match configuration"
    );
    Ok(config)
}

/// Load `path` if given, otherwise the built-in default configuration.
pub fn load_or_default(path: Option<&Path>) -> Result<MatchConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(MatchConfig::default()),
    }
}
