//! Series fetcher trait and structured error types.
//!
//! The SeriesFetcher trait abstracts over price sources (Yahoo Finance, synthetic
//! data) so the scanner can swap implementations and tests can inject failures.

use crate::domain::{Listing, Series, SeriesError};
use thiserror::Error;

/// Structured error types for fetch operations.
///
/// Any of these makes the affected symbol "data unavailable"; none of them is
/// fatal to a scan.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars returned for {symbol}")]
    Empty { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. } | DataError::Other(_)
        )
    }
}

/// Trait for price series sources.
///
/// Implementations must return bars ascending by date with volume in shares,
/// and must report symbols without data as an error rather than panicking.
/// They are shared across the scanner's worker threads.
pub trait SeriesFetcher: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch daily bars for `listing` covering the trailing `lookback_days` calendar days.
    fn fetch(&self, listing: &Listing, lookback_days: u32) -> Result<Series, DataError>;

    /// Check if the source is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

impl<F: SeriesFetcher + ?Sized> SeriesFetcher for std::sync::Arc<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, listing: &Listing, lookback_days: u32) -> Result<Series, DataError> {
        (**self).fetch(listing, lookback_days)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(DataError::NetworkUnreachable("timeout".into()).is_transient());
        assert!(DataError::RateLimited { retry_after_secs: 5 }.is_transient());
        assert!(!DataError::SymbolNotFound { symbol: "9999.TW".into() }.is_transient());
        assert!(!DataError::CircuitBreakerTripped.is_transient());
        assert!(!DataError::Empty { symbol: "9999.TW".into() }.is_transient());
    }
}
