//! Retry combinator with randomized exponential backoff.
//!
//! The default [`BackoffPolicy`] makes at most 6 attempts. Before retry `n`
//! (1-based) it waits a random duration bounded above by
//! `clamp(base * 2^(n-1), min_wait, max_wait)`, i.e. 1s, 2s, 4s, ... capped at
//! 60s. Each wait is drawn from `[previous_wait, ceiling]`, so the sequence is
//! jittered but never shrinks.
//!
//! # Usage
//!
//! ```ignore
//! use resilient_llm::retry::{BackoffPolicy, RetryExecutor};
//!
//! let executor = RetryExecutor::new();
//! let text = executor
//!     .execute(&BackoffPolicy::default(), || async { transport.send(..).await })
//!     .await?;
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{LlmError, Result};

/// Default number of attempts, including the first call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
/// Lower bound for every backoff wait.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(1);
/// Upper bound for every backoff wait.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(60);

/// Which errors trigger another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryOn {
    /// Retry whatever the operation returned.
    #[default]
    AnyError,
    /// Stop on errors that [`LlmError::is_recoverable`] rejects.
    Transient,
}

impl RetryOn {
    fn allows(&self, error: &LlmError) -> bool {
        match self {
            Self::AnyError => true,
            Self::Transient => error.is_recoverable(),
        }
    }
}

/// Attempt cap and wait bounds for the retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Unit the exponential ceiling is multiplied from.
    pub base: Duration,
    /// No wait is shorter than this.
    pub min_wait: Duration,
    /// No wait is longer than this.
    pub max_wait: Duration,
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Draw each wait at random below the ceiling instead of using it as is.
    pub jitter: bool,
    /// Which errors are worth another attempt.
    pub retry_on: RetryOn,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            jitter: true,
            retry_on: RetryOn::AnyError,
        }
    }
}

impl BackoffPolicy {
    /// Policy with the given attempt cap and wait bounds, jitter enabled.
    pub fn new(max_attempts: u32, min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            max_attempts,
            min_wait,
            max_wait,
            ..Default::default()
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// Attempts actually made by the executor.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Upper bound of the wait before retry `retry` (1-based).
    pub fn ceiling(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let max = self.max_wait.max(self.min_wait);
        self.base.saturating_mul(factor).clamp(self.min_wait, max)
    }

    /// Sequence of waits for successive retries, drawn from `rng`.
    pub fn waits<R: Rng>(&self, rng: R) -> Backoff<'_, R> {
        Backoff {
            policy: self,
            retry: 0,
            previous: Duration::ZERO,
            rng,
        }
    }
}

/// Infinite iterator over backoff waits.
///
/// Every item is at least `min_wait`, at most `max_wait`, and no smaller than
/// the item before it.
#[derive(Debug)]
pub struct Backoff<'a, R> {
    policy: &'a BackoffPolicy,
    retry: u32,
    previous: Duration,
    rng: R,
}

impl<R: Rng> Iterator for Backoff<'_, R> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.retry = self.retry.saturating_add(1);
        let ceiling = self.policy.ceiling(self.retry);

        let wait = if self.policy.jitter {
            let low = self.previous.max(self.policy.min_wait).min(ceiling);
            let low_ms = u64::try_from(low.as_millis()).unwrap_or(u64::MAX);
            let high_ms = u64::try_from(ceiling.as_millis()).unwrap_or(u64::MAX);
            if low_ms >= high_ms {
                ceiling
            } else {
                Duration::from_millis(self.rng.gen_range(low_ms..=high_ms)).max(low)
            }
        } else {
            ceiling
        };

        self.previous = wait;
        Some(wait)
    }
}

/// Runs an async operation until it succeeds or the policy gives up.
#[derive(Debug)]
pub struct RetryExecutor {
    log_retries: bool,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutor {
    /// Create a new retry executor.
    pub fn new() -> Self {
        Self { log_retries: true }
    }

    /// Create a retry executor without logging.
    pub fn silent() -> Self {
        Self { log_retries: false }
    }

    /// Execute `operation` under `policy`, with jitter drawn from OS entropy.
    ///
    /// Returns the first success, or the error of the final attempt unchanged.
    /// No attempt is made past `policy.max_attempts`.
    pub async fn execute<F, Fut, T>(&self, policy: &BackoffPolicy, operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_rng(policy, StdRng::from_entropy(), operation)
            .await
    }

    /// Same as [`execute`](Self::execute) with a caller-supplied jitter source.
    pub async fn execute_with_rng<F, Fut, T, R>(
        &self,
        policy: &BackoffPolicy,
        rng: R,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        R: Rng,
    {
        let max_attempts = policy.attempts();
        let mut waits = policy.waits(rng);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match operation().await {
                Ok(v) => {
                    if attempts > 1 && self.log_retries {
                        debug!(attempts, "Operation succeeded after retry");
                    }
                    return Ok(v);
                }
                Err(e) => {
                    if attempts >= max_attempts {
                        if self.log_retries {
                            debug!(attempts, error = %e, "Giving up");
                        }
                        return Err(e);
                    }

                    if !policy.retry_on.allows(&e) {
                        if self.log_retries {
                            debug!(attempts, error = %e, "Error is non-retryable, stopping");
                        }
                        return Err(e);
                    }

                    // The iterator never ends.
                    let delay = waits.next().unwrap_or(policy.max_wait);
                    if self.log_retries {
                        debug!(
                            "Attempt {}/{} failed, retrying in {:?}: {}",
                            attempts, max_attempts, delay, e
                        );
                    }

                    sleep(delay).await;
                }
            }
        }
    }
}

/// Retry `operation` up to `max_attempts` times with jittered exponential
/// backoff between `min_wait` and `max_wait`.
///
/// ```ignore
/// let text = retry_with_backoff(6, Duration::from_secs(1), Duration::from_secs(60), || {
///     invoker.complete_once(&request)
/// })
/// .await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    max_attempts: u32,
    min_wait: Duration,
    max_wait: Duration,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    RetryExecutor::new()
        .execute(&BackoffPolicy::new(max_attempts, min_wait, max_wait), operation)
        .await
}
