//! Tests for the full validation pipeline.

use super::*;
use crate::schema::*;

#[test]
fn default_config_validates() {
    assert!(validate(&TetherConfig::default()).is_ok());
}

#[test]
fn catches_zero_width() {
    let mut config = TetherConfig::default();
    config.window.width = 0;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.width"));
}

#[test]
fn catches_height_too_large() {
    let mut config = TetherConfig::default();
    config.window.height = 20_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.height"));
}

#[test]
fn edge_sizes_are_valid() {
    let mut config = TetherConfig::default();
    config.window.width = 1;
    config.window.height = 16384;
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_blank_title() {
    let mut config = TetherConfig::default();
    config.window.title = "   ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.title"));
}

#[test]
fn catches_url_and_html_together() {
    let mut config = TetherConfig::default();
    config.window.url = Some("https://example.org".into());
    config.window.html = Some("<p>hi</p>".into());
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("mutually exclusive"));
}

#[test]
fn catches_unknown_log_level() {
    let mut config = TetherConfig::default();
    config.logging.level = "verbose".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("logging.level"));
}

#[test]
fn collects_every_error() {
    let mut config = TetherConfig::default();
    config.window.width = 0;
    config.window.height = 0;
    config.logging.level = "loud".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("window.width"));
    assert!(err.contains("window.height"));
    assert!(err.contains("logging.level"));
}
