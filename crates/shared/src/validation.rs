//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of an invitation label, in characters.
pub const MAX_LABEL_LENGTH: usize = 200;

lazy_static::lazy_static! {
    /// Usernames handed to the media service: 3-32 of `[A-Za-z0-9_.-]`.
    pub static ref USERNAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").unwrap();
}

/// Trims free text and collapses blank input to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates an (already normalized) invitation label.
pub fn validate_label(label: &str) -> Result<(), ValidationError> {
    if label.chars().count() <= MAX_LABEL_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("label_length");
        err.message = Some(format!("Label must be at most {} characters", MAX_LABEL_LENGTH).into());
        Err(err)
    }
}
