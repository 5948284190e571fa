//! Core TOML config loading: read from path or platform default.

use std::path::Path;

use tether_common::ConfigError;
use tracing::info;

use super::paths::{create_default_config, default_config_path};
use crate::schema::TetherConfig;
use crate::validation;

/// Load and validate config from a specific TOML file.
///
/// Missing fields take their serde defaults. Unlike a missing field, a
/// value out of range is an error.
pub fn load_from_path(path: &Path) -> Result<TetherConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: TetherConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    validation::validate(&config)?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/tether/config.toml`
/// On Linux: `~/.config/tether/config.toml`
///
/// If the file does not exist, a commented default is written and the
/// defaults are returned.
pub fn load_default() -> Result<TetherConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, creating default", path.display());
            create_default_config(&path)?;
            Ok(TetherConfig::default())
        }
        other => other,
    }
}
