// Validation of relation tag prefixes submitted on the configuration form

use crate::config::tags;
use crate::errors::{AppError, AppResult};

pub fn is_valid_tag(tag_text: &str) -> bool {
    !tag_text.is_empty()
        && tag_text.chars().count() <= tags::MAX_TAG_LENGTH
        && !tag_text.chars().any(char::is_whitespace)
}

/// Validate a prefix for `field`, naming the field in the error
pub fn validate_tag(field: &str, tag_text: &str) -> AppResult<()> {
    if is_valid_tag(tag_text) {
        Ok(())
    } else {
        Err(AppError::validation(
            field,
            format!(
                "Relation tags must be 1-{} characters without spaces.",
                tags::MAX_TAG_LENGTH
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_tag() {
        assert!(is_valid_tag("thumb:"));
        assert!(is_valid_tag("img.small"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("thumb :"));
        assert!(!is_valid_tag(&"x".repeat(tags::MAX_TAG_LENGTH + 1)));
        assert!(is_valid_tag(&"x".repeat(tags::MAX_TAG_LENGTH)));
    }

    #[test]
    fn test_validate_tag_names_field() {
        let err = validate_tag("thumb_tag", "a b").unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "thumb_tag"));
    }
}
