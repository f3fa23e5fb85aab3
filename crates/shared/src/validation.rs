//! Common validation utilities used by request DTOs.

use validator::ValidationError;

/// Minimum number of characters in a phone number.
const MIN_PHONE_LEN: usize = 7;

/// Maximum number of characters in a phone number.
const MAX_PHONE_LEN: usize = 20;

/// Normalizes an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates that a value is not empty after trimming whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a loosely formatted phone number.
///
/// Accepts digits, spaces and `+ ( ) - .`, with 7 to 20 characters overall.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '(' | ')' | '-' | '.'));
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();

    if allowed
        && (MIN_PHONE_LEN..=MAX_PHONE_LEN).contains(&trimmed.len())
        && digits >= MIN_PHONE_LEN - 1
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number format is invalid".into());
        Err(err)
    }
}

/// Validates a URL slug: lowercase ASCII letters, digits and single dashes.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug.len() <= 200
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug_format");
        err.message =
            Some("Slug may only contain lowercase letters, digits and single dashes".into());
        Err(err)
    }
}

/// Rejects angle brackets in plain-text fields that end up in emails.
pub fn validate_no_html(value: &str) -> Result<(), ValidationError> {
    if value.contains('<') || value.contains('>') {
        let mut err = ValidationError::new("html_not_allowed");
        err.message = Some("HTML is not allowed in this field".into());
        Err(err)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Coach@Example.COM "), "coach@example.com");
    }

    #[test]
    fn test_normalize_email_is_idempotent() {
        use fake::{faker::internet::en::SafeEmail, Fake};
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            let once = normalize_email(&email.to_uppercase());
            assert_eq!(normalize_email(&once), once);
            assert_eq!(once, email.to_lowercase());
        }
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }

    #[test]
    fn test_validate_phone_accepts_common_formats() {
        assert!(validate_phone("+44 20 7946 0958").is_ok());
        assert!(validate_phone("(555) 123-4567").is_ok());
        assert!(validate_phone("0761234567").is_ok());
        assert!(validate_phone("555.123.4567").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_garbage() {
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("+1 555 123 4567 ext 9").is_err());
        assert!(validate_phone("---------").is_err());
    }

    #[test]
    fn test_validate_phone_error_message() {
        let err = validate_phone("abc").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Phone number format is invalid"
        );
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("pre-game-nerves").is_ok());
        assert!(validate_slug("focus-2024").is_ok());
        assert!(validate_slug("a").is_ok());
    }

    #[test]
    fn test_validate_slug_rejects_bad_shapes() {
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Upper-Case").is_err());
        assert!(validate_slug("-leading").is_err());
        assert!(validate_slug("trailing-").is_err());
        assert!(validate_slug("double--dash").is_err());
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("ümlaut").is_err());
    }

    #[test]
    fn test_validate_no_html() {
        assert!(validate_no_html("Hello, I'd like a session.").is_ok());
        assert!(validate_no_html("<script>alert(1)</script>").is_err());
        assert!(validate_no_html("a > b").is_err());
    }
}
