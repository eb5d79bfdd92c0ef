//! # Retry
//!
//! Runs the inner chain again after a failure, up to a fixed number of
//! attempts. Calls are synchronous and back-to-back: there is no delay
//! between attempts.
//!
//! Dispatch failures (undefined method, restricted method, unknown
//! decorator) are structural and fail on the first attempt. Every other
//! failure is retried; when attempts run out the last failure is returned
//! unchanged.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use veneer_core::{Arguments, Decoratable, Decorator, Error, Next, Result};

/// Default total attempts (first call included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, first call included. Zero is treated as one.
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryConfig {
    /// Whether a failure on attempt `attempt` (1-based) may be followed by another.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.max(1)
    }
}

/// Whether `err` may succeed on a later attempt.
#[must_use]
pub fn is_retryable(err: &Error) -> bool {
    !err.is_dispatch_failure()
}

/// Retry decorator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Retry {
    config: RetryConfig,
}

impl Retry {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Retry with `max_attempts` total attempts.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(RetryConfig { max_attempts })
    }

    #[must_use]
    pub fn config(&self) -> RetryConfig {
        self.config
    }
}

impl<T> Decorator<T> for Retry
where
    T: Decoratable,
    T::Output: Default,
{
    fn handle(
        &self,
        _instance: &T,
        method: &str,
        _args: &Arguments,
        next: Option<Next<'_, T::Output>>,
    ) -> Result<T::Output> {
        let Some(next) = next else {
            return Ok(T::Output::default());
        };

        let mut attempt = 1;
        loop {
            match next.run() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(method, attempt, "Retry succeeded");
                    }
                    return Ok(value);
                }
                Err(err) if is_retryable(&err) && self.config.should_retry(attempt) => {
                    warn!(method, attempt, error = %err, "Attempt failed, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn name(&self) -> &str {
        "retry"
    }
}
