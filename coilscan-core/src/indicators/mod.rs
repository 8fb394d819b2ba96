//! Indicator implementations.
//!
//! Indicators are pure functions: bar history in, numeric series out, one value
//! per bar. Warmup positions are `f64::NAN`.
//!
//! # Look-ahead guard
//! No value at bar t may depend on bars after t. Every indicator must give the
//! same value at t whether computed on the full series or on the series
//! truncated after t.

pub mod ema;
pub mod macd;
pub mod sma;

pub use ema::ewm_of_series;
pub use macd::{Macd, MacdOutput};
pub use sma::{sma_at, sma_of_series, Sma};

use crate::domain::PriceBar;

/// Trait for single-series indicators over close prices.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev close, high/low = max/min(open, close) ± 1.0, volume = 1000 shares.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
