//! Error types for the session runtime.

use std::time::Duration;
use thiserror::Error;

/// Failure of a refresh or verification call.
///
/// Cloneable so that one refresh outcome can be handed to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The server rejected the session (HTTP 401).
    ///
    /// This is the only failure that ends a session.
    #[error("Session is no longer valid")]
    Unauthorized,

    /// The request never produced a response (DNS, TLS, timeout, offline).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-401 error status.
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },

    /// The response could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The task running the refresh was cancelled before it finished.
    #[error("Refresh was abandoned before it completed")]
    Abandoned,
}

impl SessionError {
    /// Whether this failure ends the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status behind this failure, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Invalid session timing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionConfigError {
    /// Lifetime must be positive.
    #[error("Session lifetime must be greater than zero")]
    ZeroLifetime,

    /// The refresh would be scheduled at or after expiry.
    #[error("Refresh buffer ({buffer:?}) must be shorter than the session lifetime ({lifetime:?})")]
    BufferTooLarge {
        /// Configured buffer.
        buffer: Duration,
        /// Configured lifetime.
        lifetime: Duration,
    },

    /// At least one attempt is required.
    #[error("Max retry attempts must be at least 1")]
    ZeroRetries,
}

/// Failure to persist or load auth state.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document is not valid JSON for the auth state.
    #[error("Stored auth state is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
