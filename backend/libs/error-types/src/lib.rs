//! Shared error vocabulary for Agora services.
//!
//! Every failure that crosses the HTTP boundary is rendered as an [`ErrorResponse`]
//! carrying a stable [`ErrorKind`] code and a human-readable message. Services keep
//! their own error enums and map onto these kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable machine-readable error codes
pub mod error_codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INVALID_OPERATION: &str = "INVALID_OPERATION";
    pub const UPSTREAM_SERVICE_ERROR: &str = "UPSTREAM_SERVICE_ERROR";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Error taxonomy shared across the API surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing account, post, comment or notification
    NotFound,
    /// Missing/expired session, or actor lacks permission for the mutation
    Unauthorized,
    /// Empty content, malformed email, short password, duplicate handle/email
    ValidationError,
    /// Structurally forbidden action (self-follow)
    InvalidOperation,
    /// Image store unreachable or misconfigured
    UpstreamServiceError,
    /// Document store unreachable after bounded retries
    StoreUnavailable,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => error_codes::NOT_FOUND,
            ErrorKind::Unauthorized => error_codes::UNAUTHORIZED,
            ErrorKind::ValidationError => error_codes::VALIDATION_ERROR,
            ErrorKind::InvalidOperation => error_codes::INVALID_OPERATION,
            ErrorKind::UpstreamServiceError => error_codes::UPSTREAM_SERVICE_ERROR,
            ErrorKind::StoreUnavailable => error_codes::STORE_UNAVAILABLE,
            ErrorKind::Internal => error_codes::INTERNAL_ERROR,
        }
    }

    /// HTTP status code this kind maps to
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Unauthorized => 401,
            ErrorKind::ValidationError | ErrorKind::InvalidOperation => 400,
            ErrorKind::UpstreamServiceError => 502,
            ErrorKind::StoreUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Whether a client may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::UpstreamServiceError | ErrorKind::StoreUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// JSON failure envelope returned by every endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }
}
