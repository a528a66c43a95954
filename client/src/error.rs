//! Error types for the marketplace API client

use boxoffice_core::{ApiResponse, FieldError, ValidationError};
use boxoffice_runtime::SessionError;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur when interacting with the marketplace API
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server answered with an error status
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server message, or a fallback naming the status
        message: String,
        /// Raw error body
        data: Option<Value>,
        /// Field-level errors
        errors: Vec<FieldError>,
    },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The request timed out
    #[error("Request timed out")]
    Timeout,

    /// A successful response could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// A successful response carried no `data`
    #[error("Response carried no data")]
    MissingData,

    /// The request could not be encoded
    #[error("Request encoding failed: {0}")]
    Encode(String),

    /// The payload failed local validation and was not sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session could not be refreshed; every request waiting on that
    /// refresh gets the same error
    #[error("Session refresh failed: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// Build an error from a non-2xx response.
    pub(crate) fn from_response(status: StatusCode, body: Option<Value>) -> Self {
        let envelope = body
            .clone()
            .and_then(|b| serde_json::from_value::<ApiResponse<Value>>(b).ok());
        let message = envelope
            .as_ref()
            .and_then(|e| e.message.clone())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
        Self::Api {
            status: status.as_u16(),
            message,
            data: body,
            errors: envelope.and_then(|e| e.errors).unwrap_or_default(),
        }
    }

    pub(crate) fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error.to_string())
        }
    }

    /// HTTP status behind this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Session(e) => e.status(),
            _ => None,
        }
    }

    /// Whether the server rejected the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Field-level errors, from the server or local validation.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Api { errors, .. } => errors,
            Self::Validation(e) => e.errors(),
            _ => &[],
        }
    }

    /// Whether repeating the request may succeed. Client errors (4xx) and
    /// local failures are final.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Session(SessionError::Network(_)) => true,
            Self::Session(SessionError::Server { status, .. }) => *status >= 500,
            _ => false,
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Session(e) => e,
            ApiError::Api { status: 401, .. } => Self::Unauthorized,
            ApiError::Api {
                status, message, ..
            } => Self::Server { status, message },
            ApiError::Network(message) => Self::Network(message),
            ApiError::Timeout => Self::Network("request timed out".to_string()),
            ApiError::Decode(message) | ApiError::Encode(message) => Self::InvalidResponse(message),
            ApiError::MissingData => Self::InvalidResponse("response carried no data".to_string()),
            ApiError::Validation(e) => Self::InvalidResponse(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_keeps_server_message_and_fields() {
        let body = json!({
            "success": false,
            "status": "fail",
            "message": "Validation failed",
            "errors": [{ "field": "email", "message": "Email already registered" }]
        });
        let error = ApiError::from_response(StatusCode::UNPROCESSABLE_ENTITY, Some(body.clone()));

        assert_eq!(error.to_string(), "Validation failed");
        assert_eq!(error.status(), Some(422));
        assert_eq!(error.field_errors()[0].field, "email");
        assert!(matches!(error, ApiError::Api { data: Some(ref d), .. } if *d == body));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_error_falls_back_to_status_message() {
        let error = ApiError::from_response(StatusCode::BAD_GATEWAY, None);
        assert_eq!(error.to_string(), "Request failed with status code 502");
        assert!(error.is_retryable());
    }

    #[test]
    fn test_session_mapping() {
        let unauthorized = ApiError::from_response(StatusCode::UNAUTHORIZED, None);
        assert!(unauthorized.is_unauthorized());
        assert_eq!(SessionError::from(unauthorized), SessionError::Unauthorized);

        assert!(ApiError::Session(SessionError::Unauthorized).is_unauthorized());
        assert_eq!(
            SessionError::from(ApiError::Timeout),
            SessionError::Network("request timed out".to_string())
        );
        assert!(matches!(
            SessionError::from(ApiError::from_response(StatusCode::SERVICE_UNAVAILABLE, None)),
            SessionError::Server { status: 503, .. }
        ));
    }
}
