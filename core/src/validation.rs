//! Client-side payload validation.
//!
//! Payloads are checked before they are sent so that obviously malformed
//! requests never reach the server. Rules collect every failing field rather
//! than stopping at the first one.
//!
//! # Example
//!
//! ```
//! use boxoffice_core::validation::Rules;
//!
//! let result = Rules::new()
//!     .email("email", "not-an-email")
//!     .min_chars("password", "abc", 6, "Password must be at least 6 characters")
//!     .finish();
//!
//! let err = result.unwrap_err();
//! assert_eq!(err.errors().len(), 2);
//! ```

use crate::envelope::FieldError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[allow(clippy::expect_used)] // Pattern is a literal
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[allow(clippy::expect_used)] // Pattern is a literal
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("url pattern compiles")
});

/// One or more payload fields failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", summary(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Field-level failures, in rule order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consume into the field-level failures.
    #[must_use]
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }

    /// First message reported for `field`.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Payloads that can check themselves before being sent.
pub trait Validate {
    /// Check the payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every failing field.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Accumulates field failures.
#[derive(Debug, Default)]
#[must_use]
pub struct Rules {
    errors: Vec<FieldError>,
}

impl Rules {
    /// Start an empty rule set.
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure when `ok` is false.
    pub fn check(mut self, ok: bool, field: &str, message: &str) -> Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// At least `min` characters.
    pub fn min_chars(self, field: &str, value: &str, min: usize, message: &str) -> Self {
        self.check(value.chars().count() >= min, field, message)
    }

    /// Non-blank.
    pub fn required(self, field: &str, value: &str, message: &str) -> Self {
        self.check(!value.trim().is_empty(), field, message)
    }

    /// Looks like an email address.
    pub fn email(self, field: &str, value: &str) -> Self {
        self.check(is_email(value), field, "Invalid email address")
    }

    /// Absent, empty, or an http(s) URL.
    pub fn optional_url(self, field: &str, value: Option<&str>) -> Self {
        let ok = value.is_none_or(|v| v.is_empty() || is_url(v));
        self.check(ok, field, "Invalid URL")
    }

    /// At least 8 characters with upper, lower, and a digit.
    pub fn strong_password(self, field: &str, value: &str) -> Self {
        self.min_chars(field, value, 8, "Password must be at least 8 characters")
            .check(
                value.chars().any(char::is_uppercase),
                field,
                "Password must contain at least one uppercase letter",
            )
            .check(
                value.chars().any(char::is_lowercase),
                field,
                "Password must contain at least one lowercase letter",
            )
            .check(
                value.chars().any(|c| c.is_ascii_digit()),
                field,
                "Password must contain at least one number",
            )
    }

    /// Finish, failing if any rule failed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when at least one rule failed.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

/// Whether `value` looks like an email address.
#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Whether `value` is an absolute http(s) URL.
#[must_use]
pub fn is_url(value: &str) -> bool {
    URL_PATTERN.is_match(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_email("fan@example.com"));
        assert!(!is_email("fan@example"));
        assert!(!is_email("fan example@x.io"));
        assert!(!is_email(""));
    }

    #[test]
    fn test_url_pattern() {
        assert!(is_url("https://tickets.example.ug/shows"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("example.com"));
    }

    #[test]
    fn test_strong_password_reports_each_missing_class() {
        let err = Rules::new()
            .strong_password("password", "abcdefgh")
            .finish()
            .unwrap_err();
        let messages: Vec<_> = err.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Password must contain at least one uppercase letter",
                "Password must contain at least one number",
            ]
        );
    }

    #[test]
    fn test_optional_url_accepts_empty() {
        assert!(Rules::new().optional_url("websiteUrl", None).finish().is_ok());
        assert!(Rules::new().optional_url("websiteUrl", Some("")).finish().is_ok());
        assert!(Rules::new().optional_url("websiteUrl", Some("nope")).finish().is_err());
    }

    #[test]
    fn test_error_display_lists_fields() {
        let err = Rules::new()
            .required("campaignId", " ", "Campaign is required")
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "validation failed: campaignId: Campaign is required");
        assert_eq!(err.message_for("campaignId"), Some("Campaign is required"));
    }
}
