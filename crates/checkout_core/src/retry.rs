use std::time::Duration;

use crate::{BatchConfig, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    fn stop() -> Self {
        Self {
            retry: false,
            delay: Duration::ZERO,
        }
    }
}

/// Plain exponential backoff with a ceiling. Only server errors (5xx) and
/// transport failures (status 0) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_count: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            retry_count,
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.retry_count, config.base_delay(), config.max_delay())
    }

    /// Total tries including the initial one.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    pub fn is_retryable(error: &RemoteError) -> bool {
        error.is_server_error() || error.is_transport()
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Decides whether failed attempt `attempt` (1-based) should be retried.
    pub fn should_retry(&self, error: &RemoteError, attempt: u32) -> RetryDecision {
        if !Self::is_retryable(error) || attempt >= self.max_attempts() {
            return RetryDecision::stop();
        }
        RetryDecision {
            retry: true,
            delay: self.backoff_delay(attempt),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&BatchConfig::new("", ""))
    }
}
