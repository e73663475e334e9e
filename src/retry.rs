//! Exponential backoff retry for transient browser operations.
//!
//! Navigation, element waits and sort selection go through a [`RetryPolicy`]
//! at the call site:
//!
//! ```ignore
//! policy.run("open site", || async move { session.goto(url).await }).await?;
//! ```
//!
//! # Backoff Strategy
//!
//! The delay before attempt `n + 1` follows:
//! ```text
//! delay = clamp(multiplier * 2^(n-1), min_delay, max_delay) + random_jitter(0..=jitter)
//! ```
//! With the defaults (3 attempts, 1s multiplier, 4s..10s window, no jitter)
//! a failing operation is tried three times with two 4s pauses.

use crate::config::RetrySettings;
use rand::{Rng, rng};
use std::fmt::{self, Display};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, warn};

/// Retry policy: attempt budget, backoff window and retry predicate.
pub struct RetryPolicy<E = crate::error::ScrapeError> {
    /// Total attempts, including the first.
    max_attempts: usize,
    /// Scale of the exponential term.
    multiplier: Duration,
    /// Lower bound on any delay.
    min_delay: Duration,
    /// Upper bound on any delay.
    max_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    jitter: Duration,
    /// Errors for which another attempt is made.
    retry_if: fn(&E) -> bool,
}

fn retry_any<E>(_: &E) -> bool {
    true
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("multiplier", &self.multiplier)
            .field("min_delay", &self.min_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .finish()
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl<E> RetryPolicy<E> {
    pub fn new(
        max_attempts: usize,
        multiplier: Duration,
        min_delay: Duration,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            multiplier,
            min_delay,
            max_delay,
            jitter: Duration::ZERO,
            retry_if: retry_any::<E>,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.multiplier_ms),
            Duration::from_millis(settings.min_delay_ms),
            Duration::from_millis(settings.max_delay_ms),
        )
        .with_jitter(Duration::from_millis(settings.jitter_ms))
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Restrict retries to errors accepted by `predicate`.
    #[must_use]
    pub fn with_retry_if(mut self, predicate: fn(&E) -> bool) -> Self {
        self.retry_if = predicate;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Deterministic part of the delay after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(31);
        let raw = self.multiplier.saturating_mul(1 << exp);
        raw.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }

    fn delay(&self, attempt: usize) -> Duration {
        let base = self.backoff(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        base + Duration::from_millis(rng().random_range(0..=max_ms))
    }

    /// Run `op` until it succeeds, the error is not retryable, or the
    /// attempt budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_total = total_t0.elapsed().as_millis();

                    if attempt >= self.max_attempts || !(self.retry_if)(&e) {
                        error!(
                            label,
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_total,
                            error = %e,
                            "operation failed; giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.delay(attempt);
                    warn!(
                        label,
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use std::cell::Cell;

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(
            attempts,
            Duration::from_millis(1),
            Duration::from_millis(1),
            Duration::from_millis(2),
        )
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy: RetryPolicy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = fast_policy(3)
            .run("flaky", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        Err(ScrapeError::Browser("transient".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), ScrapeError> = fast_policy(3)
            .run("always fails", || {
                calls.set(calls.get() + 1);
                async { Err(ScrapeError::Browser("down".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(ScrapeError::Browser(_))));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Cell::new(0);
        let policy = fast_policy(3)
            .with_retry_if(|e: &ScrapeError| !matches!(e, ScrapeError::Config(_)));
        let result: Result<(), ScrapeError> = policy
            .run("bad config", || {
                calls.set(calls.get() + 1);
                async { Err(ScrapeError::Config("nope".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
