use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for session service

// Compile regex patterns once at startup
// These patterns are hardcoded and always valid, so we use expect() with explicit reasoning
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // This regex is hardcoded and validated - it is a compile-time constant in practice
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Normalize an email for storage and lookup (trimmed, lower-cased)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format (RFC 5322 simplified)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Check password strength requirements
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
///
/// Returns the first violated rule, or `None` if the password is acceptable.
pub fn password_policy_violation(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Some("password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Some("password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Some("password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("password must contain a digit");
    }
    None
}

/// validator crate compatible custom validator for email format
pub fn validate_email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// validator crate compatible custom validator for the password policy
pub fn validate_password_policy_validator(password: &str) -> Result<(), ValidationError> {
    match password_policy_violation(password) {
        None => Ok(()),
        Some(_) => Err(ValidationError::new("weak_password")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
        assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
    }

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn test_invalid_email() {
        assert!(!validate_email("invalid"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_valid_password() {
        assert_eq!(password_policy_violation("Password123"), None);
        assert_eq!(password_policy_violation("MyP@ssw0rd"), None);
    }

    #[test]
    fn test_invalid_password() {
        assert!(password_policy_violation("Pass1").is_some()); // Too short
        assert!(password_policy_violation("password123").is_some()); // No uppercase
        assert!(password_policy_violation("PASSWORD123").is_some()); // No lowercase
        assert!(password_policy_violation("Passwordabc").is_some()); // No digit
        assert!(password_policy_violation("wrong").is_some());
    }

    #[test]
    fn test_email_validator() {
        assert!(validate_email_validator("a@b.com").is_ok());
        assert!(validate_email_validator("a@b").is_err());
        assert!(validate_email_validator("").is_err());
    }

    #[test]
    fn test_policy_validator() {
        assert!(validate_password_policy_validator("Password123").is_ok());
        assert!(validate_password_policy_validator("password").is_err());
    }
}
