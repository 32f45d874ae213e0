//! Retry strategy
//!
//! Decides which failed requests are retried and how long to wait between
//! attempts. Airtable rate-limits at the base level and answers with HTTP 429,
//! so by default only 429 responses are retried, on any method.

use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Default number of retries
pub const DEFAULT_TOTAL: u32 = 5;

/// Default backoff factor in seconds
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.1;

/// Default upper bound on a single backoff sleep (in seconds)
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 120;

/// Retry policy applied by [`HttpClient`](crate::http::HttpClient)
#[derive(Debug, Clone, PartialEq)]
pub struct RetryStrategy {
    /// Maximum number of retries after the first attempt
    pub total: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_factor: f64,
    /// Status codes that trigger a retry
    pub status_forcelist: Vec<u16>,
    /// Methods eligible for retry; `None` means any method
    pub allowed_methods: Option<Vec<Method>>,
    /// Whether to sleep for the duration given by a `Retry-After` header
    pub respect_retry_after: bool,
    /// Upper bound on any single sleep
    pub max_backoff: Duration,
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self {
            total: DEFAULT_TOTAL,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            status_forcelist: vec![StatusCode::TOO_MANY_REQUESTS.as_u16()],
            allowed_methods: None,
            respect_retry_after: true,
            max_backoff: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
        }
    }
}

/// Build the default retry strategy
///
/// Retries HTTP 429 up to five times with a 0.1s exponential backoff.
/// Use the `with_*` methods to customize it.
pub fn retry_strategy() -> RetryStrategy {
    RetryStrategy::default()
}

impl RetryStrategy {
    /// A strategy that never retries
    pub fn none() -> Self {
        Self {
            total: 0,
            ..Self::default()
        }
    }

    /// Set the maximum number of retries
    pub fn with_total(mut self, total: u32) -> Self {
        self.total = total;
        self
    }

    /// Set the backoff factor (seconds)
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Replace the list of retried status codes
    pub fn with_status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = statuses.into_iter().collect();
        self
    }

    /// Restrict retries to the given methods
    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = Some(methods.into_iter().collect());
        self
    }

    /// Enable or disable honouring `Retry-After`
    pub fn with_respect_retry_after(mut self, respect: bool) -> Self {
        self.respect_retry_after = respect;
        self
    }

    /// Set the upper bound on a single sleep
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    fn method_allowed(&self, method: &Method) -> bool {
        match &self.allowed_methods {
            Some(methods) => methods.contains(method),
            None => true,
        }
    }

    /// Check if a response status should be retried
    ///
    /// `attempt` is the number of retries already performed.
    pub fn should_retry(&self, method: &Method, status: StatusCode, attempt: u32) -> bool {
        attempt < self.total
            && self.method_allowed(method)
            && self.status_forcelist.contains(&status.as_u16())
    }

    /// Check if a transport failure (timeout, refused connection) should be retried
    pub fn should_retry_transport(&self, method: &Method, attempt: u32) -> bool {
        attempt < self.total && self.method_allowed(method)
    }

    /// Calculate how long to sleep before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if self.respect_retry_after {
            if let Some(wait) = retry_after {
                return wait.min(self.max_backoff);
            }
        }

        // Exponential backoff: factor * 2^attempt
        let secs = self.backoff_factor * 2_f64.powi(attempt.min(31) as i32);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}
