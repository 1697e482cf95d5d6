/// Error types for social-service
///
/// Every variant maps onto a stable [`ErrorKind`]; handlers return `AppError`
/// and actix renders it as the shared JSON failure envelope.
use crate::repository::StoreError;
use crate::services::media::MediaError;
use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use crypto_core::TokenError;
use error_types::{ErrorKind, ErrorResponse};
use thiserror::Error;

/// Result type for social-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing account, post, comment or notification
    #[error("{0}")]
    NotFound(String),

    /// Missing/expired session, or actor lacks permission for the mutation
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    /// Structurally forbidden action (self-follow)
    #[error("{0}")]
    InvalidOperation(String),

    /// Image store unreachable or misconfigured
    #[error("{0}")]
    UpstreamService(String),

    /// Store still failing after bounded retries
    #[error("{0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            AppError::UpstreamService(_) => ErrorKind::UpstreamServiceError,
            AppError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        let mut response = HttpResponse::build(self.status_code());
        if kind.is_retryable() {
            response.insert_header((header::RETRY_AFTER, "1"));
        }
        response.json(ErrorResponse::new(kind, self.to_string()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) | StoreError::Timeout => {
                tracing::error!(error = %err, "Store unavailable after retries");
                AppError::StoreUnavailable("Service temporarily unavailable".to_string())
            }
            StoreError::Conflict(constraint) => {
                AppError::Validation(format!("Duplicate value violates {}", constraint))
            }
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "Store rejected operation");
                AppError::Internal("Server Error".to_string())
            }
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        tracing::warn!(error = %err, "Image store call failed");
        AppError::UpstreamService(err.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::Unauthorized("Unauthorized, Token Expired".into()),
            TokenError::Invalid(_) => AppError::Unauthorized("Unauthorized".into()),
            TokenError::Signing(msg) => AppError::Internal(format!("Token signing failed: {}", msg)),
        }
    }
}
