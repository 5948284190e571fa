//! Tether configuration.
//!
//! TOML-based configuration with full validation. Every section uses serde
//! defaults, so a partial file (or no file at all) is a valid config.
//!
//! ```rust,no_run
//! use tether_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BridgeConfig, LoggingConfig, TetherConfig, WindowConfig};

use std::path::Path;

use tether_common::ConfigError;

/// Load config from `path` if given, otherwise from the platform default
/// location. Both paths validate what they read.
pub fn load_config(path: Option<&Path>) -> Result<TetherConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &TetherConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
