//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod bridge;
mod logging;
mod window;

pub use bridge::*;
pub use logging::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Root configuration for Tether.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    pub window: WindowConfig,
    pub bridge: BridgeConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_common::{SizeHint, UnknownBindingPolicy};

    #[test]
    fn empty_toml_gives_defaults() {
        let config: TetherConfig = toml::from_str("").unwrap();
        assert_eq!(config, TetherConfig::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: TetherConfig = toml::from_str(
            r#"
[window]
width = 1024
size_hint = "fixed"

[bridge]
unknown_binding = "reject"
"#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.size_hint, SizeHint::Fixed);
        assert_eq!(config.bridge.unknown_binding, UnknownBindingPolicy::Reject);
        assert!(!config.bridge.log_payloads);
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        let result: Result<TetherConfig, _> = toml::from_str("[bridge]\nunknown_binding = \"ignore\"\n");
        assert!(result.is_err());
    }
}
