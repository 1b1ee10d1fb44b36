//! Error types for the explorer core.
//!
//! - [`ErrorKind`] - the user-facing failure taxonomy published on the view
//! - [`ClientError`] - failures reported by listing/content clients
//! - [`StoreError`] - persisted-store failures (never escape the cache)
//! - [`ConfigError`] - invalid runtime configuration

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ErrorKind
// =============================================================================

/// Classified failure of a listing or content fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The service could not be reached, or the key has no homeserver.
    NetworkUnreachable,
    /// The directory or file does not exist.
    NotFound,
    /// The current actor may not read this path.
    Forbidden,
    /// The request took too long.
    Timeout,
    /// The request was superseded by a newer navigation.
    Canceled,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Classify a free-form failure message.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("error sending request")
            || lower.contains("failed to fetch")
            || lower.contains("connection")
            || lower.contains("network")
        {
            Self::NetworkUnreachable
        } else if lower.contains("timed out") || lower.contains("timeout") {
            Self::Timeout
        } else if lower.contains("not found") || lower.contains("404") {
            Self::NotFound
        } else if lower.contains("forbidden")
            || lower.contains("unauthorized")
            || lower.contains("401")
            || lower.contains("403")
        {
            Self::Forbidden
        } else {
            Self::Unknown
        }
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 | 410 => Self::NotFound,
            401 | 403 => Self::Forbidden,
            408 | 504 => Self::Timeout,
            502 | 503 => Self::NetworkUnreachable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkUnreachable => write!(f, "cannot reach homeserver or key does not exist"),
            Self::NotFound => write!(f, "not found"),
            Self::Forbidden => write!(f, "access denied"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Canceled => write!(f, "request superseded"),
            Self::Unknown => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for ErrorKind {}

// =============================================================================
// ClientError
// =============================================================================

/// Failure reported by a [`ListingClient`](super::ListingClient) or
/// [`ContentClient`](super::ContentClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport-level failure before any response arrived.
    #[error("error sending request: {0}")]
    Unreachable(String),
    /// Non-success HTTP status.
    #[error("HTTP error: {0}")]
    Status(u16),
    /// No response within the client's deadline.
    #[error("request timed out")]
    Timeout,
    /// Response arrived but could not be read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Free-form error from an opaque client.
    #[error("{0}")]
    Other(String),
}

impl From<&ClientError> for ErrorKind {
    fn from(e: &ClientError) -> Self {
        match e {
            ClientError::Unreachable(_) => Self::NetworkUnreachable,
            ClientError::Status(status) => Self::from_status(*status),
            ClientError::Timeout => Self::Timeout,
            ClientError::InvalidResponse(_) => Self::Unknown,
            ClientError::Other(message) => Self::from_message(message),
        }
    }
}

impl From<ClientError> for ErrorKind {
    fn from(e: ClientError) -> Self {
        Self::from(&e)
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Persisted-store failures. The cache swallows these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage is not available (e.g. no window, private mode).
    #[error("storage unavailable")]
    Unavailable,
    /// Writing would exceed the store's size budget.
    #[error("storage quota exceeded ({needed} bytes needed, {limit} allowed)")]
    QuotaExceeded { needed: usize, limit: usize },
    /// Underlying I/O failure (file-backed store).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Backend-specific write failure.
    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

// =============================================================================
// ConfigError
// =============================================================================

/// Invalid [`ExplorerConfig`](crate::config::ExplorerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
