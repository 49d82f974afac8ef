//! Retry policy for transient fetch failures
//!
//! Delays grow exponentially: `base_delay * 2^(attempt - 1)`, capped at
//! [`MAX_RETRY_DELAY`].

use crate::config::HttpConfig;
use std::time::Duration;

/// Upper bound for a single backoff delay
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Decision on whether to retry a failed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again
    Retry { delay: Duration },

    /// Give up
    GiveUp,
}

/// Bounded retry configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    max_attempts: u32,

    /// Delay before the first retry
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &HttpConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after `attempt` (1-indexed) failed
    pub fn should_retry(&self, transient: bool, attempt: u32) -> RetryDecision {
        if !transient || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry {
            delay: self.delay_for(attempt),
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}
