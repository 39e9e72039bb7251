//! Shared retry policy
//!
//! Every section generator goes through [`RetryPolicy::run`]. The policy is
//! parameterised by the number of extra attempts, a classifier deciding
//! whether an error is worth retrying, and a [`Backoff`] computing the delay
//! before each retry (base doubling per attempt plus bounded random jitter).

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff with additive jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max_jitter: Duration,
}

impl Backoff {
    /// Create a backoff
    #[inline]
    #[must_use]
    pub fn new(base: Duration, max_jitter: Duration) -> Self {
        Self { base, max_jitter }
    }

    /// Backoff with no jitter
    #[inline]
    #[must_use]
    pub fn fixed(base: Duration) -> Self {
        Self::new(base, Duration::ZERO)
    }

    /// Delay after the failed attempt `attempt` (0-based)
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self.base.saturating_mul(2u32.saturating_pow(attempt));
        exponential.saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(250))
    }
}

/// The last error once the policy gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted<E> {
    pub error: E,
    /// Total attempts made, including the first
    pub attempts: u32,
}

/// Retry policy shared by all section generators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` attempts after the first
    #[inline]
    #[must_use]
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Single attempt, no retries
    #[inline]
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(0, Backoff::fixed(Duration::ZERO))
    }

    /// Extra attempts after the first
    #[inline]
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff between attempts
    #[inline]
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// `op` receives the 0-based attempt number.
    ///
    /// # Errors
    /// The last error and the number of attempts made.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, is_retryable: C) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let attempts = attempt + 1;
                    if !is_retryable(&error) {
                        tracing::debug!(attempts, error = %error, "non-retryable error");
                        return Err(Exhausted { error, attempts });
                    }
                    if attempt >= self.max_retries {
                        tracing::warn!(attempts, error = %error, "retries exhausted");
                        return Err(Exhausted { error, attempts });
                    }
                    let delay = self.backoff.delay(attempt);
                    tracing::warn!(
                        attempt = attempts,
                        max_retries = self.max_retries,
                        ?delay,
                        error = %error,
                        "attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Backoff::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles() {
        let backoff = Backoff::fixed(Duration::from_millis(100));
        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
    }

    #[test]
    fn jitter_is_bounded() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(50));
        for _ in 0..100 {
            let d = backoff.delay(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn huge_attempt_saturates() {
        let backoff = Backoff::fixed(Duration::from_secs(1));
        assert!(backoff.delay(200) >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Backoff::fixed(Duration::from_secs(1)));

        let result = policy
            .run(
                |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err("flaky".to_string())
                        } else {
                            Ok(n)
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Backoff::fixed(Duration::from_secs(1)));
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(format!("fail {attempt}")) }
                },
                |_| true,
            )
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.error, "fail 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff on the paused clock
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Backoff::fixed(Duration::from_secs(1)));
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("unauthorized".to_string()) }
                },
                |e: &String| e != "unauthorized",
            )
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
