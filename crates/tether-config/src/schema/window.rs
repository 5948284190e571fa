//! Window configuration types.

use serde::{Deserialize, Serialize};
use tether_common::SizeHint;

/// The single window hosting the page.
///
/// At most one of `url` and `html` may be set; with neither, a blank page
/// is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub size_hint: SizeHint,
    pub url: Option<String>,
    pub html: Option<String>,
    /// Enable web inspector (always on in debug builds).
    pub devtools: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tether".into(),
            width: 800,
            height: 600,
            size_hint: SizeHint::None,
            url: None,
            html: None,
            devtools: cfg!(debug_assertions),
        }
    }
}
