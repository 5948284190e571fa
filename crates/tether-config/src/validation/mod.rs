//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all and
//! collects every error into a single `ConfigError`.

mod helpers;
mod logging;
mod window;

#[cfg(test)]
mod tests;

use tether_common::ConfigError;

use crate::schema::TetherConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TetherConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    window::validate_window(&mut errors, config);
    logging::validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
