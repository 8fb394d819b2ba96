//! Bounded retry policy for flaky provider calls.
//!
//! Each fetch gets its own attempt budget. Sleeping happens on the calling
//! worker thread only, so one slow symbol never stalls the rest of the pool.

use super::provider::DataError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Delay doubles on every retry.
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
    /// Upper bound for a provider-requested Retry-After wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff: Backoff::Exponential,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait before attempt `attempt` (0-based). Attempt 0 never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
        }
    }

    /// Wait before retry `attempt` following `error`.
    ///
    /// A rate-limit reply stretches the backoff to the provider's Retry-After,
    /// capped at `max_delay`. The cap never shortens the regular backoff.
    pub fn retry_delay(&self, attempt: u32, error: &DataError) -> Duration {
        let backoff = self.delay_before(attempt);
        match error {
            DataError::RateLimited { retry_after_secs } => Duration::from_secs(*retry_after_secs)
                .min(self.max_delay)
                .max(backoff),
            _ => backoff,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `op` receives the 0-based attempt number. Only errors for which
    /// [`DataError::is_transient`] holds are retried; the last error is returned.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, DataError>
    where
        F: FnMut(u32) -> Result<T, DataError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < attempts => {
                    attempt += 1;
                    let delay = self.retry_delay(attempt, &e);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient fetch error, retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
