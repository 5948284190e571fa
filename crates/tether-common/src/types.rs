//! Small value types shared across the bridge, config, and window layer.

use serde::{Deserialize, Serialize};

/// How `set_size` width/height are interpreted by the window layer.
///
/// The discriminants are part of the C-style boundary and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum SizeHint {
    /// Width and height are the default size.
    #[default]
    None = 0,
    /// Width and height are minimum bounds.
    Min = 1,
    /// Width and height are maximum bounds.
    Max = 2,
    /// Window size can not be changed by the user.
    Fixed = 3,
}

impl SizeHint {
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn is_resizable(self) -> bool {
        self != SizeHint::Fixed
    }
}

impl TryFrom<i32> for SizeHint {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(SizeHint::None),
            1 => Ok(SizeHint::Min),
            2 => Ok(SizeHint::Max),
            3 => Ok(SizeHint::Fixed),
            other => Err(other),
        }
    }
}

/// What to do with an Invoke whose binding name is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnknownBindingPolicy {
    /// Discard silently; the caller's promise stays pending.
    #[default]
    Drop,
    /// Settle the caller's promise with a failure status.
    Reject,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_hint_raw_values_are_stable() {
        assert_eq!(SizeHint::None.as_raw(), 0);
        assert_eq!(SizeHint::Min.as_raw(), 1);
        assert_eq!(SizeHint::Max.as_raw(), 2);
        assert_eq!(SizeHint::Fixed.as_raw(), 3);
    }

    #[test]
    fn size_hint_from_raw() {
        assert_eq!(SizeHint::try_from(0), Ok(SizeHint::None));
        assert_eq!(SizeHint::try_from(3), Ok(SizeHint::Fixed));
        assert_eq!(SizeHint::try_from(4), Err(4));
        assert_eq!(SizeHint::try_from(-1), Err(-1));
    }

    #[test]
    fn only_fixed_is_not_resizable() {
        assert!(SizeHint::None.is_resizable());
        assert!(SizeHint::Min.is_resizable());
        assert!(SizeHint::Max.is_resizable());
        assert!(!SizeHint::Fixed.is_resizable());
    }

    #[test]
    fn size_hint_serde_lowercase() {
        let json = serde_json::to_string(&SizeHint::Fixed).unwrap();
        assert_eq!(json, "\"fixed\"");
        let hint: SizeHint = serde_json::from_str("\"min\"").unwrap();
        assert_eq!(hint, SizeHint::Min);
    }

    #[test]
    fn unknown_binding_policy_defaults_to_drop() {
        assert_eq!(UnknownBindingPolicy::default(), UnknownBindingPolicy::Drop);
        let policy: UnknownBindingPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, UnknownBindingPolicy::Reject);
    }
}
