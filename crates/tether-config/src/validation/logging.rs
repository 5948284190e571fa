//! Logging section constraints.

use crate::schema::TetherConfig;

use super::helpers::validate_one_of;

pub(crate) const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub(crate) fn validate_logging(errors: &mut Vec<String>, config: &TetherConfig) {
    validate_one_of(errors, "logging.level", &config.logging.level, LOG_LEVELS);
}
