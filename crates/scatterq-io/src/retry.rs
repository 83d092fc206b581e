//! Retry/backoff settings for catalog listing.

use std::thread;
use std::time::Duration;

use scatterq_core::config::ConnectionConfig;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn from_connection(cfg: &ConnectionConfig) -> Self {
        Self {
            max_retries: cfg.retry_max_retries,
            initial_backoff: Duration::from_millis(cfg.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.retry_max_backoff_ms),
        }
    }

    /// Backoff before retry number `attempt` (1-based), doubling up to the cap.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let mut backoff = self.initial_backoff;
        for _ in 1..attempt {
            backoff = std::cmp::min(backoff * 2, self.max_backoff);
        }
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Run `op` until it succeeds, `retryable` rejects the error, or retries run out.
    pub fn run<T, E, F, R>(&self, what: &str, mut op: F, retryable: R) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        R: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 0usize;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_retries || !retryable(&err) {
                        return Err(err);
                    }
                    attempt += 1;
                    let backoff = self.backoff_for(attempt);
                    warn!(%err, attempt, ?backoff, "{what} failed, retrying");
                    thread::sleep(backoff);
                }
            }
        }
    }
}
