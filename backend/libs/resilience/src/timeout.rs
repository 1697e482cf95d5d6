/// Timeout wrapper for async operations
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
        }
    }
}

/// Outcome of a bounded call: either the deadline passed or the call itself failed.
/// The inner error is kept intact so callers can still classify it.
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Operation failed: {0}")]
    Inner(E),
}

/// Execute a future with timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, Duration>
where
    F: Future<Output = T>,
{
    timeout(duration, future).await.map_err(|_| duration)
}

/// Execute a fallible future with timeout
pub async fn with_timeout_result<F, T, E>(
    duration: Duration,
    future: F,
) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_elapsed() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert_eq!(result, Err(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_timeout_result_keeps_inner_error() {
        let result: Result<(), TimeoutError<&str>> =
            with_timeout_result(Duration::from_secs(1), async { Err("not found") }).await;

        assert!(matches!(result, Err(TimeoutError::Inner("not found"))));
    }

    #[tokio::test]
    async fn test_timeout_result_elapsed() {
        let result: Result<(), TimeoutError<&str>> =
            with_timeout_result(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
    }
}
