//! Retry classification and backoff.

use std::time::Duration;

use rand::Rng;

use super::BackendError;
use crate::config::RetryConfig;

/// When and how long to wait before retrying a failed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub jitter: f64,
    pub transient_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            factor: config.factor.max(1),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter.clamp(0.0, 1.0),
            transient_statuses: config.transient_statuses.clone(),
        }
    }
}

impl RetryPolicy {
    /// Whether `err` is worth another attempt.
    ///
    /// Authentication failures are never transient, whatever the status
    /// list says. Timeouts are handled by the caller's deadline.
    pub fn is_transient(&self, err: &BackendError) -> bool {
        match err {
            BackendError::Status { status: 401 | 403, .. } => false,
            BackendError::Status { status, .. } => self.transient_statuses.contains(status),
            BackendError::Connection(_) => true,
            BackendError::Timeout | BackendError::Decode(_) | BackendError::Credential(_) => false,
        }
    }

    /// Backoff before retry `retry` (0-based), without jitter.
    pub fn base_backoff(&self, retry: u32) -> Duration {
        let multiplier = self.factor.saturating_pow(retry);
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// Backoff before retry `retry` (0-based), with jitter applied and
    /// clamped to `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.base_backoff(retry);
        if self.jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let spread = base.as_secs_f64() * self.jitter;
        let offset = rand::rng().random_range(-spread..=spread);
        let jittered = (base.as_secs_f64() + offset).clamp(0.0, self.max_delay.as_secs_f64());
        Duration::from_secs_f64(jittered)
    }
}

/// Short human-readable reason for a transient failure, for logs.
pub fn classify_error(err: &BackendError) -> &'static str {
    match err {
        BackendError::Status { status: 429, .. } => "rate limited by API",
        BackendError::Status { status: 529, .. } => "API overloaded",
        BackendError::Status { status: 502, .. } => "API gateway error",
        BackendError::Status { status: 503, .. } => "service unavailable",
        BackendError::Status { status, .. } if *status >= 500 => "server error",
        BackendError::Status { .. } => "request rejected",
        BackendError::Connection(_) => "connection error",
        BackendError::Timeout => "request timed out",
        BackendError::Decode(_) => "unexpected response body",
        BackendError::Credential(_) => "invalid credential",
    }
}
