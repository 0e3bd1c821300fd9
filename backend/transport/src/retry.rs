//! Retry policy and failure classification.

use std::time::Duration;

use reqwest::StatusCode;
use watchdog_core::is_retryable_status;

/// Retry policy configuration. Immutable and shared by every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single wait.
    pub max_backoff: Duration,
    /// Growth factor applied per attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait after attempt `attempt` (0-indexed) fails:
    /// `min(max_backoff, initial_backoff * multiplier^attempt)`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let cap = self.max_backoff.as_secs_f64();
        if !secs.is_finite() || secs >= cap {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Whether another attempt is allowed after attempt `attempt` (0-indexed).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// How a single attempt's outcome should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Transient,
    Permanent,
}

/// 2xx succeeds; 429 and 500/502/503/504 retry; everything else is final.
pub fn classify_status(status: StatusCode) -> Classification {
    if status.is_success() {
        Classification::Success
    } else if is_retryable_status(status.as_u16()) {
        Classification::Transient
    } else {
        Classification::Permanent
    }
}

/// Timeouts and failures to establish a connection are transient.
pub fn classify_error(err: &reqwest::Error) -> Classification {
    if err.is_timeout() || err.is_connect() {
        Classification::Transient
    } else {
        Classification::Permanent
    }
}
