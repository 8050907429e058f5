//! Bounded retry with exponential backoff for remote calls.
//!
//! Every generation call goes through [`RetryExecutor::execute`]. Only errors
//! that classify themselves as retryable are retried; anything else,
//! including errors that cannot be classified, fails on first occurrence.
//! The executor holds no per-call state, so concurrent callers each get
//! independent attempt counters.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info_span, warn, Instrument};

use shotline_genai::GenAiError;

use crate::metrics::record_retry;

/// Why a failed attempt may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Unavailability or internal error
    Transient,
    /// Rate limiting or quota exhaustion
    RateLimited,
}

impl RetryClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryClass::Transient => "transient",
            RetryClass::RateLimited => "rate_limited",
        }
    }
}

/// Errors that know whether they are worth retrying.
pub trait Retryable {
    /// `None` for terminal errors.
    fn retry_class(&self) -> Option<RetryClass>;
}

impl Retryable for GenAiError {
    fn retry_class(&self) -> Option<RetryClass> {
        if self.is_rate_limited() {
            Some(RetryClass::RateLimited)
        } else if self.is_transient() {
            Some(RetryClass::Transient)
        } else {
            None
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay for transient failures.
    pub base_delay: Duration,
    /// Base delay for rate-limit failures.
    pub rate_limit_base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            rate_limit_base_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, class: RetryClass, attempt: u32) -> Duration {
        let base = match class {
            RetryClass::Transient => self.base_delay,
            RetryClass::RateLimited => self.rate_limit_base_delay,
        };
        base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Executes remote calls under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds, fails terminally, or the attempt budget is
    /// spent. The last error is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            let span = info_span!("retry", operation = %operation, attempt = attempt + 1);
            let error = match op().instrument(span).await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            let class = match error.retry_class() {
                Some(class) if attempt + 1 < max_attempts => class,
                _ => return Err(error),
            };

            let delay = self.policy.delay_for(class, attempt);
            warn!(
                operation = %operation,
                attempt = attempt + 1,
                class = class.as_str(),
                delay_ms = delay.as_millis() as u64,
                "Remote call failed, retrying: {}",
                error
            );
            record_retry(operation, class);

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
