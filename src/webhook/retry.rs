//! Retry policy and the retry loop that drives webhook delivery.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::{AttemptError, DeliveryError, InvalidMultiplier};
use crate::time::Sleeper;

/// Configuration for exponential backoff with optional jitter.
///
/// After the attempt with 0-based index `n` fails, the next attempt waits
/// `min(max_delay, initial_delay * multiplier^n)`. With jitter enabled that
/// delay is then scaled by a random factor in
/// [`JITTER_MIN`](Self::JITTER_MIN)..=[`JITTER_MAX`](Self::JITTER_MAX), so
/// concurrent dispatchers failing together do not retry in lockstep.
///
/// # Defaults
///
/// - `max_retries`: 5 (six attempts in total)
/// - `initial_delay`: 1 second
/// - `max_delay`: 60 seconds
/// - `multiplier`: 2.0
/// - `jitter`: enabled
///
/// # Example
///
/// ```
/// use hookledger::webhook::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_retries(3)
///     .with_initial_delay(Duration::from_millis(250))
///     .with_jitter(false);
///
/// assert_eq!(policy.delay_for_retry(2), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    ///
    /// Zero means a single attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound on the un-jittered delay.
    pub max_delay: Duration,

    /// Growth factor applied per failed attempt.
    pub multiplier: f64,

    /// Whether delays are randomly scaled.
    pub jitter: bool,
}

impl RetryPolicy {
    /// Default number of retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 5;

    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

    /// Default maximum delay (60 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(60_000);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Lower bound of the jitter factor.
    pub const JITTER_MIN: f64 = 0.5;

    /// Upper bound of the jitter factor.
    pub const JITTER_MAX: f64 = 1.5;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
            jitter: true,
        }
    }

    /// Sets the number of retries after the initial attempt.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    ///
    /// Zero is allowed (handy with [`InstantSleeper`]) but creates a tight
    /// retry loop in production.
    ///
    /// [`InstantSleeper`]: crate::time::InstantSleeper
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the upper bound on the un-jittered delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidMultiplier`] unless `multiplier` is positive and
    /// finite.
    pub fn with_multiplier(mut self, multiplier: f64) -> Result<Self, InvalidMultiplier> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(InvalidMultiplier(multiplier));
        }
        self.multiplier = multiplier;
        Ok(self)
    }

    /// Enables or disables jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total number of attempts the policy allows.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns true if another retry is allowed after `retries_made` retries.
    #[must_use]
    pub const fn should_retry(&self, retries_made: u32) -> bool {
        retries_made < self.max_retries
    }

    /// Un-jittered delay after the attempt with 0-based index `failed_attempt`.
    ///
    /// Always `min(max_delay, initial_delay * multiplier^failed_attempt)`.
    #[must_use]
    pub fn delay_for_retry(&self, failed_attempt: u32) -> Duration {
        let exponent = i32::try_from(failed_attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Delay actually slept after `failed_attempt`, jitter applied when enabled.
    #[must_use]
    pub fn backoff_delay<R: Rng + ?Sized>(&self, failed_attempt: u32, rng: &mut R) -> Duration {
        let base = self.delay_for_retry(failed_attempt);
        if !self.jitter {
            return base;
        }
        let factor = rng.random_range(Self::JITTER_MIN..=Self::JITTER_MAX);
        base.mul_f64(factor)
    }

    /// Runs `operation` until it succeeds or the policy gives up.
    ///
    /// `operation` receives the 0-based attempt index. Before every retry
    /// sleep, `on_retry` is called with the upcoming retry number, the delay
    /// and the error that triggered it.
    ///
    /// # Errors
    ///
    /// - [`DeliveryError::Rejected`] as soon as an attempt fails with a
    ///   non-retryable error
    /// - [`DeliveryError::MaxRetriesExceeded`] once `max_retries` retries
    ///   have all failed
    pub async fn execute<T, S, F, Fut, R>(
        &self,
        sleeper: &S,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<Delivered<T>, DeliveryError>
    where
        S: Sleeper,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
        R: FnMut(RetryNotice<'_>),
    {
        let mut retries_made = 0;

        loop {
            let error = match operation(retries_made).await {
                Ok(value) => {
                    return Ok(Delivered {
                        value,
                        attempts: retries_made + 1,
                    });
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(DeliveryError::Rejected {
                    attempts: retries_made + 1,
                    error,
                });
            }

            if !self.should_retry(retries_made) {
                return Err(DeliveryError::MaxRetriesExceeded {
                    attempts: retries_made + 1,
                    last_error: error,
                });
            }

            let delay = self.backoff_delay(retries_made, &mut rand::rng());
            retries_made += 1;

            on_retry(RetryNotice {
                attempt: retries_made,
                delay,
                error: &error,
            });

            sleeper.sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Information passed to the retry hook before each backoff sleep.
#[derive(Debug)]
pub struct RetryNotice<'a> {
    /// 1-based number of the retry about to happen.
    pub attempt: u32,
    /// How long the loop will sleep first.
    pub delay: Duration,
    /// The failure that triggered the retry.
    pub error: &'a AttemptError,
}

/// Successful outcome of [`RetryPolicy::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivered<T> {
    /// Value returned by the successful attempt.
    pub value: T,
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

impl<T> Delivered<T> {
    /// Number of retries that preceded success.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}
