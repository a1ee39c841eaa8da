//! Capped exponential backoff for upstream calls

use std::time::Duration;

use reqwest::StatusCode;

/// Retry policy handed to the upstream client
///
/// Attempt `n` (1-based) waits `base_delay * 2^(n-1)` before it is sent, so
/// with the default base of one second the waits are 1s, 2s, 4s, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of additional attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Whether `attempt` retries have already been used up
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_retries
    }

    /// Only server-side failures are worth another try
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status.is_server_error()
    }
}
