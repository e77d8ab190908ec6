//! Deadlines and read-path retry
//!
//! Every collaborator call goes through [`with_deadline`]. Read paths
//! additionally wrap their store calls in [`retry_read`]; mutating paths
//! must never use it.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::ReadRetryConfig;
use crate::error::AppError;
use crate::metrics::{READ_RETRIES_TOTAL, observe_collaborator_call};

/// Bounded exponential backoff for transient read failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy that tries once and never sleeps
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the attempt following the `failures`-th failure.
    ///
    /// The first retry waits `2 * base`, the second `4 * base`, and so on.
    pub fn delay_after(&self, failures: u32) -> Duration {
        let factor = 2u32.checked_pow(failures).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl From<&ReadRetryConfig> for RetryPolicy {
    fn from(config: &ReadRetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

/// Run a collaborator call under a deadline.
///
/// Expiry is reported as `AppError::Timeout(collaborator)`.
pub async fn with_deadline<T, F>(
    collaborator: &'static str,
    operation: &'static str,
    deadline: Duration,
    future: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    let started = Instant::now();
    let outcome = tokio::time::timeout(deadline, future).await;
    observe_collaborator_call(collaborator, operation, started.elapsed());

    match outcome {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = deadline.as_millis() as u64,
                "{} call exceeded its deadline",
                collaborator
            );
            Err(AppError::Timeout(collaborator))
        }
    }
}

/// Retry a read operation on transient errors.
///
/// Non-transient errors (not found, validation, ...) are returned at once.
pub async fn retry_read<T, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut failures = 0u32;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && failures + 1 < policy.max_attempts => {
                failures += 1;
                let delay = policy.delay_after(failures);
                READ_RETRIES_TOTAL.with_label_values(&[operation]).inc();
                tracing::warn!(
                    operation,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient read failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn delays_double_per_failure() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_read(fast_policy(3), "test", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(AppError::Timeout("content store"))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_read(fast_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::Database(sqlx::Error::PoolTimedOut)) }
        })
        .await;

        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), AppError> = retry_read(fast_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::NotFound("Blog post")) }
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deadline_expiry_is_a_timeout() {
        let result: Result<(), AppError> =
            with_deadline("content store", "test", Duration::from_millis(5), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AppError::Timeout("content store"))));
    }

    #[tokio::test]
    async fn durations_go_to_the_collaborators_histogram() {
        use crate::metrics::{BOT_VERIFICATION_DURATION_SECONDS, DB_QUERY_DURATION_SECONDS};

        let verify_op = "deadline_histogram_verify";
        let store_op = "deadline_histogram_store";

        with_deadline("bot verification", verify_op, Duration::from_secs(1), async {
            Ok(true)
        })
        .await
        .unwrap();
        with_deadline("content store", store_op, Duration::from_secs(1), async { Ok(()) })
            .await
            .unwrap();

        let count = |histogram: &prometheus::HistogramVec, op: &str| {
            histogram.with_label_values(&[op]).get_sample_count()
        };
        assert_eq!(count(&BOT_VERIFICATION_DURATION_SECONDS, verify_op), 1);
        assert_eq!(count(&DB_QUERY_DURATION_SECONDS, verify_op), 0);
        assert_eq!(count(&DB_QUERY_DURATION_SECONDS, store_op), 1);
        assert_eq!(count(&BOT_VERIFICATION_DURATION_SECONDS, store_op), 0);
    }
}
