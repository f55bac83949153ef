//! Bounded retry with capped exponential backoff.
//!
//! The engine only observes `Ok` vs `Err`; it has no idea what the operation
//! does. Bounds are passed per call, so manager installs, downloads and the
//! bootstrap each carry their own [`RetryPolicy`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rig_schema::RetrySetting;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below one are treated as one.
    pub max_attempts: u32,
    /// Sleep before the second attempt.
    pub initial_delay: Duration,
    /// Ceiling for the doubled delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
        }
    }

    /// Exactly one attempt.
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay slept after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl From<RetrySetting> for RetryPolicy {
    fn from(s: RetrySetting) -> Self {
        Self::new(
            s.max_attempts,
            Duration::from_millis(s.initial_delay_ms),
            Duration::from_millis(s.max_delay_ms),
        )
    }
}

/// A successful result plus the number of attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// The last failure after all attempts were used (or a non-retryable failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.last, self.attempts)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Run `op` until it succeeds or `policy.max_attempts` is reached.
///
/// `op` receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, op: F) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    with_retry_if(policy, |_| true, op).await
}

/// Like [`with_retry`], but stops early when `should_retry` rejects an error.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: RetryPolicy,
    should_retry: P,
    mut op: F,
) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: fmt::Display,
{
    let max = policy.attempts();
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return Ok(Retried {
                    value,
                    attempts: attempt,
                });
            }
            Err(e) if attempt < max && should_retry(&e) => {
                let delay = policy.delay_after(attempt);
                tracing::debug!(attempt, max, ?delay, error = %e, "attempt failed, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(RetryError {
                    attempts: attempt,
                    last: e,
                });
            }
        }
    }
}
