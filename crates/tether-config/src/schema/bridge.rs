//! Bridge behavior settings.

use serde::{Deserialize, Serialize};
use tether_common::UnknownBindingPolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// What to do when the page calls a binding that was never registered.
    pub unknown_binding: UnknownBindingPolicy,
    /// Log decoded call arguments at debug level.
    pub log_payloads: bool,
}
