use std::time::Duration;

use crate::config::RetryConfig;

/// High-level classification of an error for backoff purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP 5xx other than 503.
    Http5xx(u16),
    /// Local disk failure.
    Storage,
    /// Anything else (4xx, short body, ...).
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Attempt budget spent.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed attempt budget with capped exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub retry_count: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        let max_delay = Duration::from_secs(cfg.max_delay_secs);
        // Out-of-range base delays (inf, huge) fall back to the cap.
        let base_delay =
            Duration::try_from_secs_f64(cfg.base_delay_secs.max(0.0)).unwrap_or(max_delay);
        Self {
            retry_count: cfg.retry_count,
            base_delay,
            max_delay,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `retry_count` times without sleeping in between.
    pub fn immediate(retry_count: u32) -> Self {
        Self {
            retry_count,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Total attempts per item, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts() {
            return RetryDecision::NoRetry;
        }

        // base * 2^(attempt-1), capped; throttling doubles it.
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        let mut delay = self.base_delay.saturating_mul(exp);
        if kind == ErrorKind::Throttled {
            delay = delay.saturating_mul(2);
        }
        RetryDecision::RetryAfter(delay.min(self.max_delay))
    }
}
