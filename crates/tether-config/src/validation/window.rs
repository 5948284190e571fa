//! Window section constraints.

use crate::schema::TetherConfig;

use super::helpers::validate_range;

/// Largest window edge accepted, in logical pixels.
pub(crate) const MAX_WINDOW_EDGE: u32 = 16384;

pub(crate) fn validate_window(errors: &mut Vec<String>, config: &TetherConfig) {
    let window = &config.window;

    validate_range(errors, "window.width", window.width, 1, MAX_WINDOW_EDGE);
    validate_range(errors, "window.height", window.height, 1, MAX_WINDOW_EDGE);

    if window.title.trim().is_empty() {
        errors.push("window.title must not be empty".into());
    }
    if window.url.is_some() && window.html.is_some() {
        errors.push("window.url and window.html are mutually exclusive".into());
    }
}
