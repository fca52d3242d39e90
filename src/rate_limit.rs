use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::{ImportError, Result};

/// Requests per second NCBI grants anonymous callers
pub const NCBI_ANONYMOUS_RATE: f64 = 3.0;
/// Requests per second NCBI grants callers sending an API key
pub const NCBI_KEYED_RATE: f64 = 10.0;

/// Shared request budget for eUtils traffic
///
/// Clones share one budget, so every clone of a `PubMedClient` draws from
/// the same allowance. Going over the NCBI limit gets the caller's IP
/// blocked.
///
/// ```
/// use pubmed_import_rs::RateLimiter;
///
/// let anonymous = RateLimiter::new(3.0);
/// let shared = anonymous.clone();
/// ```
#[derive(Clone)]
pub struct RateLimiter {
    budget: Arc<Mutex<Budget>>,
}

struct Budget {
    available: f64,
    burst: f64,
    per_second: f64,
    updated_at: Instant,
}

impl Budget {
    /// Credit the allowance earned since the last update, up to `burst`
    fn replenish(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.updated_at);
        let earned = elapsed.as_secs_f64() * self.per_second;
        self.available = (self.available + earned).min(self.burst);
        self.updated_at = now;
    }

    /// Spend one request, or report how long until one is available
    fn try_spend(&mut self) -> std::result::Result<(), Duration> {
        self.replenish(Instant::now());
        if self.available >= 1.0 {
            self.available -= 1.0;
            return Ok(());
        }
        Err(Duration::from_secs_f64((1.0 - self.available) / self.per_second))
    }
}

impl RateLimiter {
    /// Budget of `per_second` requests; bursts up to one second's worth
    pub fn new(per_second: f64) -> Self {
        let per_second = per_second.max(0.0);
        let burst = per_second.max(1.0);
        Self {
            budget: Arc::new(Mutex::new(Budget {
                available: burst,
                burst,
                per_second,
                updated_at: Instant::now(),
            })),
        }
    }

    pub fn for_ncbi(has_api_key: bool) -> Self {
        if has_api_key {
            Self::new(NCBI_KEYED_RATE)
        } else {
            Self::new(NCBI_ANONYMOUS_RATE)
        }
    }

    /// Wait until a request may be sent
    ///
    /// A caller that wakes up to find the slot taken by another task waits
    /// again rather than failing.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<()> {
        loop {
            let pause = {
                let mut budget = self.budget.lock().await;
                if budget.per_second <= 0.0 && budget.available < 1.0 {
                    warn!("Request budget is exhausted and never refills");
                    return Err(ImportError::RateLimitExceeded);
                }
                match budget.try_spend() {
                    Ok(()) => {
                        debug!(left = budget.available, "Request slot granted");
                        return Ok(());
                    }
                    Err(pause) => pause,
                }
            };

            debug!(pause_ms = pause.as_millis() as u64, "Waiting for a request slot");
            tokio::time::sleep(pause).await;
        }
    }

    /// Whether `acquire` would return without waiting
    pub async fn check_available(&self) -> bool {
        let mut budget = self.budget.lock().await;
        budget.replenish(Instant::now());
        budget.available >= 1.0
    }

    pub async fn rate(&self) -> f64 {
        self.budget.lock().await.per_second
    }
}
