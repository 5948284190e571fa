//! Shared validation helpers.

/// Push an error if `value` is outside `[min, max]`.
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is not one of `allowed`.
pub(crate) fn validate_one_of(errors: &mut Vec<String>, name: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        errors.push(format!(
            "{name} = {value:?} must be one of: {}",
            allowed.join(", ")
        ));
    }
}
