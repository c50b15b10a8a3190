//! Retry policy for outbound API calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::{IonQError, IonQResult};

/// How often and how patiently to repeat a failed call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Factor applied to the delay after every retry.
    pub backoff: u32,
    /// Upper bound on any single delay, jitter included.
    pub max_delay: Duration,
    /// Upper bound of the uniform random delay added to each retry.
    pub jitter: Duration,
    /// Which errors are worth another attempt.
    pub retry_if: fn(&IonQError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::attempts(1)
    }
}

impl RetryPolicy {
    /// `n` attempts, retried immediately.
    pub fn attempts(n: u32) -> Self {
        Self {
            max_attempts: n.max(1),
            initial_delay: Duration::ZERO,
            backoff: 1,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            retry_if: IonQError::is_retriable,
        }
    }

    /// Patient policy for polling and read-only calls: doubling delays from
    /// one second, up to one second of jitter, at most sixty seconds apart.
    pub fn long_poll() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_secs(1),
            backoff: 2,
            max_delay: Duration::from_secs(60),
            jitter: Duration::from_secs(1),
            retry_if: IonQError::is_retriable,
        }
    }

    /// Replace the retry predicate.
    #[must_use]
    pub fn with_retry_if(mut self, retry_if: fn(&IonQError) -> bool) -> Self {
        self.retry_if = retry_if;
        self
    }

    /// Delay before retry number `retry` (0-based), without jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        let factor = self.backoff.max(1).saturating_pow(retry);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay.max(self.initial_delay))
    }

    fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.base_delay(retry);
        if !self.jitter.is_zero() {
            let extra = rand::thread_rng().gen_range(0.0..=self.jitter.as_secs_f64());
            delay += Duration::from_secs_f64(extra);
        }
        if self.max_delay.is_zero() {
            delay
        } else {
            delay.min(self.max_delay)
        }
    }

    /// Run `op` until it succeeds, fails with a non-retriable error, or runs
    /// out of attempts. The last error is returned in the latter two cases.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> IonQResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = IonQResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && (self.retry_if)(&e) => {
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        "Retrying after transient failure (backoff {:?}): {}",
                        delay,
                        e
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn unavailable() -> IonQError {
        IonQError::Api {
            status: 503,
            error_type: "unavailable".into(),
            message: "try later".into(),
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let value = RetryPolicy::attempts(5)
            .run("submit_job", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err(unavailable()) } else { Ok(n) } }
            })
            .await
            .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::attempts(3)
            .run("delete_job", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(unavailable()) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IonQError::Api { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retriable_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::attempts(5)
            .run("cancel_job", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(IonQError::MissingToken) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IonQError::MissingToken));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_predicate() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::attempts(4).with_retry_if(|e| matches!(e, IonQError::JobError(_)));
        let _ = policy
            .run("retrieve_job", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(IonQError::JobError("not yet".into())) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_long_poll_delays_double_and_cap() {
        let policy = RetryPolicy::long_poll();
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay(3), Duration::from_secs(8));
        assert_eq!(policy.base_delay(10), Duration::from_secs(60));
        for retry in 0..policy.max_attempts {
            let d = policy.delay_for(retry);
            assert!(d >= policy.base_delay(retry).min(policy.max_delay));
            assert!(d <= policy.max_delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_poll_sleeps_between_attempts() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let policy = RetryPolicy {
            jitter: Duration::ZERO,
            ..RetryPolicy::long_poll()
        };
        let _ = policy
            .run("retrieve_job", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { if n < 3 { Err(unavailable()) } else { Ok(()) } }
            })
            .await;
        // 1 s + 2 s + 4 s of backoff before the fourth attempt.
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }
}
