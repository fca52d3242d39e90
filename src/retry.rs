//! Retry with exponential backoff for transient network failures

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// Classifies errors as transient (worth retrying) or permanent
pub trait RetryableError {
    /// Whether the failed operation may succeed if attempted again
    fn is_retryable(&self) -> bool;

    /// Short human readable reason, used in logs
    fn retry_reason(&self) -> &str;
}

/// Backoff settings for network calls
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Randomize delays to avoid synchronized retries
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Delays between attempts, in order
    pub fn delays(&self) -> Vec<Duration> {
        // ExponentialBackoff yields base^n * factor, so base 2 doubles each step
        let factor = (self.initial_delay.as_millis() as u64 / 2).max(1);
        let backoff = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .take(self.max_retries);

        if self.use_jitter {
            backoff.map(jitter).collect()
        } else {
            backoff.collect()
        }
    }
}

/// Run `operation`, retrying transient failures according to `config`
pub async fn with_retry<F, Fut, T, E>(
    operation: F,
    config: &RetryConfig,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    let delays = config.delays();
    debug!(
        operation = operation_name,
        max_retries = delays.len(),
        "Starting operation with retry"
    );

    RetryIf::start(delays, operation, |err: &E| {
        let retry = err.is_retryable();
        if retry {
            warn!(
                operation = operation_name,
                reason = err.retry_reason(),
                error = %err,
                "Transient failure, retrying"
            );
        }
        retry
    })
    .await
}
