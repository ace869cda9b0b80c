//! Action name validation

use crate::DecodeError;

/// Default maximum action name length
pub const DEFAULT_MAX_ACTION_NAME_LENGTH: usize = 256;

/// Check a percent-decoded action name
///
/// Names are non-empty, at most `max_length` bytes, and restricted to
/// `[A-Za-z0-9_.:-]` so they can be used as routing keys without escaping.
pub fn validate_action_name(name: &str, max_length: usize) -> Result<(), DecodeError> {
    if name.is_empty() {
        return Err(DecodeError::EmptyActionName);
    }

    if name.len() > max_length {
        return Err(DecodeError::ActionNameTooLong {
            len: name.len(),
            max: max_length,
        });
    }

    if !name.chars().all(is_valid_name_char) {
        return Err(DecodeError::InvalidActionName(name.to_string()));
    }

    Ok(())
}

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-')
}
