//! The JSON envelope every marketplace endpoint responds with.
//!
//! ```json
//! { "success": true, "message": "ok", "data": { ... } }
//! { "success": false, "status": "fail", "message": "Validation failed",
//!   "errors": [{ "field": "email", "message": "Invalid email address" }] }
//! ```

use serde::{Deserialize, Serialize};

/// Server-side failure class carried by error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// Client-caused failure (4xx).
    Fail,
    /// Server-caused failure (5xx).
    Error,
}

/// A single field-level error reported by the server or by local validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as the API knows it (camelCase).
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: bool,
    /// Optional human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload.
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure class on error envelopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EnvelopeStatus>,
    /// Field-level errors on validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope around `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            status: None,
            errors: None,
        }
    }

    /// Take the payload, if present.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Page metadata returned by listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total matching items.
    pub total: u64,
    /// Total pages.
    pub pages: u32,
    /// Whether a next page exists.
    #[serde(default)]
    pub has_next: bool,
    /// Whether a previous page exists.
    #[serde(default)]
    pub has_prev: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope_without_data() {
        let json = r#"{
            "success": false,
            "status": "fail",
            "message": "Validation failed",
            "errors": [{ "field": "email", "message": "Invalid email address" }]
        }"#;
        let envelope: ApiResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.status, Some(EnvelopeStatus::Fail));
        assert!(envelope.data.is_none());
        assert_eq!(
            envelope.errors.unwrap(),
            vec![FieldError::new("email", "Invalid email address")]
        );
    }

    #[test]
    fn test_ok_envelope_round_trips_payload() {
        let envelope = ApiResponse::ok(vec![1, 2, 3]);
        assert!(envelope.success);
        assert_eq!(envelope.into_data(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_pagination_camel_case() {
        let json = r#"{"page":2,"limit":10,"total":35,"pages":4,"hasNext":true,"hasPrev":true}"#;
        let page: Pagination = serde_json::from_str(json).unwrap();
        assert_eq!(page.pages, 4);
        assert!(page.has_next && page.has_prev);
    }
}
