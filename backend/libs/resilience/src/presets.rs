/// Preset configurations for the backends the service talks to
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a backend
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: Option<RetryConfig>,
}

impl ServiceConfig {
    /// Same preset with a different timeout and retry budget
    pub fn with_limits(mut self, timeout: Duration, max_retries: u32) -> Self {
        self.timeout.duration = timeout;
        self.retry = if max_retries == 0 {
            None
        } else {
            Some(RetryConfig {
                max_retries,
                ..self.retry.unwrap_or_default()
            })
        };
        self
    }
}

/// Document store (accounts, posts, notifications)
///
/// - Timeout: 5s per attempt
/// - Retry: 2 attempts, transient errors only. Safe because every write is a
///   set-semantics update or an insert keyed by a pre-generated id.
pub fn document_store_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(5),
        },
        retry: Some(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}

/// Session store (refresh-token records in Redis)
///
/// - Timeout: 2s (cache should be fast)
/// - Retry: 2 attempts
pub fn session_store_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(2),
        },
        retry: Some(RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(25),
            max_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            jitter: true,
        }),
    }
}

/// External image store (upload/destroy over HTTP)
///
/// - Timeout: 60s (uploads can be large)
/// - No retry: an ambiguous upload failure could leave an orphaned asset
pub fn object_storage_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(60),
        },
        retry: None,
    }
}
