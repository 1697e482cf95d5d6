/// Resilience patterns for store and upstream calls
///
/// - **Timeout**: bounds every call so a stalled store cannot hold a request forever
/// - **Retry**: exponential backoff with jitter, applied only to errors the caller
///   classifies as transient (connection loss, pool exhaustion, timeouts). Logical
///   outcomes such as "not found" or unique-constraint conflicts are returned at once.
/// - **Presets**: tuned settings for the document store, the session store and the
///   external image store
///
/// # Example: store call with timeout and transient-only retry
///
/// ```rust,no_run
/// use resilience::{presets, call_with_policy};
///
/// #[derive(Debug)]
/// enum StoreError { Connection, NotFound }
///
/// impl std::fmt::Display for StoreError {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{:?}", self)
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let policy = presets::document_store_config();
///     let result = call_with_policy(
///         &policy,
///         |e: &StoreError| matches!(e, StoreError::Connection),
///         || StoreError::Connection,
///         || async { Ok::<_, StoreError>(42) },
///     )
///     .await;
///     assert_eq!(result.unwrap(), 42);
/// }
/// ```

pub mod presets;
pub mod retry;
pub mod timeout;

pub use presets::{
    document_store_config, object_storage_config, session_store_config, ServiceConfig,
};
pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
pub use timeout::{with_timeout, with_timeout_result, TimeoutConfig, TimeoutError};

use std::future::Future;

/// Run `f` under the policy's per-attempt timeout and retry budget.
///
/// A per-attempt timeout is converted into an error via `on_timeout` and is itself
/// treated as transient when `is_transient` says so. The final error is the last
/// attempt's error.
pub async fn call_with_policy<F, Fut, T, E, P, O>(
    policy: &ServiceConfig,
    is_transient: P,
    on_timeout: O,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    O: Fn() -> E,
{
    let duration = policy.timeout.duration;
    let mut attempt = || {
        let fut = f();
        let on_timeout = &on_timeout;
        async move {
            match with_timeout_result(duration, fut).await {
                Ok(value) => Ok(value),
                Err(TimeoutError::Elapsed(_)) => Err(on_timeout()),
                Err(TimeoutError::Inner(e)) => Err(e),
            }
        }
    };

    match &policy.retry {
        Some(retry) => with_retry_if(retry.clone(), &is_transient, attempt)
            .await
            .map_err(RetryError::into_inner),
        None => attempt().await,
    }
}
