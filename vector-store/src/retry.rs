//! Bounded retry with exponential backoff for transient failures.
//!
//! Only errors classified transient by [`StoreError::is_transient`] are
//! retried; schema, configuration, and validation failures surface
//! immediately on the first attempt. The window is bounded so a genuinely
//! absent service fails instead of hanging.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::StoreError;

/// Retry window: attempt count and base delay, doubled per attempt.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping between attempts.
///
/// # Errors
/// Returns the first non-transient error immediately, or the last transient
/// error once the window is exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let out = with_retry(&fast_policy(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(StoreError::Timeout)
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn surfaces_transient_after_window() {
        let calls = AtomicU32::new(0);
        let out: Result<(), _> = with_retry(&fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(StoreError::Timeout) }
        })
        .await;
        assert!(matches!(out, Err(StoreError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_errors_are_never_retried() {
        let calls = AtomicU32::new(0);
        let out: Result<(), _> = with_retry(&fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(StoreError::SchemaMismatch {
                    index: "docs".into(),
                    got: 8,
                    want: 16,
                })
            }
        })
        .await;
        assert!(matches!(out, Err(StoreError::SchemaMismatch { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(p.delay_for(1), Duration::from_millis(100));
        assert_eq!(p.delay_for(2), Duration::from_millis(200));
        assert_eq!(p.delay_for(3), Duration::from_millis(400));
    }
}
