//! Reusable deadline wrapper for store calls.
//!
//! The toolkit defines no global timeout of its own; call sites that need a
//! predictable upper bound (catalog scans over very large schemas, the
//! backup walk) wrap individual futures here.

use std::future::Future;
use std::time::Duration;

use crate::error::CoreError;

/// Run `fut` with an upper bound of `limit`.
///
/// A future that does not complete in time yields [`CoreError::Timeout`];
/// inner errors pass through untouched.
pub async fn with_deadline<F, T, E>(limit: Duration, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(CoreError::Internal(e.to_string())),
        Err(_) => Err(CoreError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn fast_futures_pass_through() {
        let result: Result<i32, CoreError> =
            with_deadline(Duration::from_secs(1), async { Ok::<_, CoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn slow_futures_time_out() {
        let result: Result<(), CoreError> = with_deadline(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CoreError>(())
        })
        .await;
        assert_matches!(result, Err(CoreError::Timeout(_)));
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let result: Result<(), CoreError> = with_deadline(Duration::from_secs(1), async {
            Err::<(), _>(CoreError::Internal("boom".to_string()))
        })
        .await;
        assert_matches!(result, Err(CoreError::Internal(_)));
    }
}
