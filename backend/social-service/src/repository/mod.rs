pub mod accounts;
pub mod memory;
pub mod notifications;
pub mod posts;
pub mod sessions;
pub mod traits;

pub use accounts::PgAccountRepository;
pub use memory::{MemoryRefreshTokenStore, MemoryStore};
pub use notifications::PgNotificationRepository;
pub use posts::PgPostRepository;
pub use sessions::RedisRefreshTokenStore;
pub use traits::{AccountStore, NotificationStore, PostStore, RefreshTokenStore, StoreResult};

/// Failure of a single store call
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Connection, pool or I/O failure; the call may succeed if repeated
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out")]
    Timeout,

    /// Anything else the backend rejected (bad statement, decode error, ...)
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Transient failures are retried; logical outcomes never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.constraint().unwrap_or("unique").to_string());
            }
        }
        if db_pool::is_transient(&err) {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            StoreError::Unavailable(err.to_string())
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::Unavailable("reset".into()).is_transient());
        assert!(!StoreError::Conflict("accounts_username_key".into()).is_transient());
        assert!(!StoreError::Backend("syntax".into()).is_transient());
    }

    #[test]
    fn test_pool_timeout_maps_to_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_transient());

        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_transient());
    }
}
