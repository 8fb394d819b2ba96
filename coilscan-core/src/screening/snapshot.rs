//! Indicator snapshot: every number the classifier needs, as of the last bar.
//!
//! A snapshot is derived fresh from a series on each evaluation and never
//! cached. Everything is computed from bars up to and including the last bar.

use crate::domain::{Series, SHARES_PER_LOT};
use crate::indicators::{sma_at, Macd};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest moving-average window.
pub const LONG_MA_WINDOW: usize = 240;
/// Bars between the current MA60 and the one it is compared against.
pub const TREND_LOOKBACK: usize = 5;
/// Minimum series length for a snapshot.
pub const MIN_BARS: usize = LONG_MA_WINDOW + TREND_LOOKBACK;
/// Rolling window for the average volume.
pub const VOLUME_WINDOW: usize = 20;

/// Why a series produced no snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Exclusion {
    #[error("insufficient history: {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("illiquid: {volume_lots:.1} lots below floor of {min_lots}")]
    LiquidityFiltered { volume_lots: f64, min_lots: f64 },

    #[error("computation error: {0}")]
    Computation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: chrono::NaiveDate,
    pub close: f64,
    /// Latest volume in shares.
    pub volume: u64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub ma60: f64,
    /// MA60 as of `TREND_LOOKBACK` bars before the last bar.
    pub ma60_earlier: f64,
    pub ma240: f64,
    pub volume_avg20: f64,
    pub macd_histogram: f64,
    pub macd_histogram_prev: f64,
    pub convergence_pct: f64,
    pub volume_ratio: f64,
    pub long_term_bias_pct: f64,
}

impl IndicatorSnapshot {
    pub fn volume_lots(&self) -> f64 {
        self.volume as f64 / SHARES_PER_LOT as f64
    }

    pub fn ma60_rising(&self) -> bool {
        self.ma60 > self.ma60_earlier
    }

    pub fn momentum_strengthening(&self) -> bool {
        self.macd_histogram > self.macd_histogram_prev
    }

    pub fn above_long_term(&self) -> bool {
        self.close > self.ma240
    }
}

/// (max / min − 1) × 100 over the three short averages.
///
/// `None` when an input is non-finite or the smallest average is not positive.
pub fn convergence_gap(a: f64, b: f64, c: f64) -> Option<f64> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return None;
    }
    let max = a.max(b).max(c);
    let min = a.min(b).min(c);
    if min <= 0.0 {
        return None;
    }
    Some((max / min - 1.0) * 100.0)
}

/// Latest volume over its rolling average. `None` on a zero or non-finite average.
pub fn volume_ratio(latest: f64, average: f64) -> Option<f64> {
    if !(latest.is_finite() && average.is_finite()) || average <= 0.0 {
        return None;
    }
    Some(latest / average)
}

/// (MA60 / MA240 − 1) × 100. `None` on a non-positive or non-finite MA240.
pub fn long_term_bias(ma60: f64, ma240: f64) -> Option<f64> {
    if !(ma60.is_finite() && ma240.is_finite()) || ma240 <= 0.0 {
        return None;
    }
    Some((ma60 / ma240 - 1.0) * 100.0)
}

fn last_of(values: &[f64], back: usize, what: &str) -> Result<f64, Exclusion> {
    let v = values
        .len()
        .checked_sub(1 + back)
        .and_then(|i| values.get(i).copied())
        .unwrap_or(f64::NAN);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Exclusion::Computation(format!("{what} is not finite")))
    }
}

/// Simple mean of the `period` values ending `back` bars before the last.
fn mean_of(values: &[f64], period: usize, back: usize, what: &str) -> Result<f64, Exclusion> {
    match sma_at(values, period, back) {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Exclusion::Computation(format!("{what} is not finite"))),
    }
}

/// Compute the snapshot for the last bar of `series`.
///
/// Checks, in order: history length, liquidity floor (in round lots), then the
/// indicator computations.
pub fn compute_snapshot(series: &Series, min_volume_lots: f64) -> Result<IndicatorSnapshot, Exclusion> {
    let bars = series.bars();
    if bars.len() < MIN_BARS {
        return Err(Exclusion::InsufficientHistory {
            bars: bars.len(),
            required: MIN_BARS,
        });
    }

    // Non-empty: length checked above.
    let last = bars[bars.len() - 1];
    let volume_lots = last.volume_lots();
    if volume_lots < min_volume_lots {
        return Err(Exclusion::LiquidityFiltered {
            volume_lots,
            min_lots: min_volume_lots,
        });
    }

    let closes = series.closes();
    let volumes = series.volumes();

    let ma5 = mean_of(&closes, 5, 0, "MA5")?;
    let ma10 = mean_of(&closes, 10, 0, "MA10")?;
    let ma20 = mean_of(&closes, 20, 0, "MA20")?;
    let ma60 = mean_of(&closes, 60, 0, "MA60")?;
    let ma60_earlier = mean_of(&closes, 60, TREND_LOOKBACK, "earlier MA60")?;
    let ma240 = mean_of(&closes, LONG_MA_WINDOW, 0, "MA240")?;
    let volume_avg20 = mean_of(&volumes, VOLUME_WINDOW, 0, "average volume")?;

    let macd = Macd::default().compute_series(&closes);
    let macd_histogram = last_of(&macd.histogram, 0, "MACD histogram")?;
    let macd_histogram_prev = last_of(&macd.histogram, 1, "previous MACD histogram")?;

    let convergence_pct = convergence_gap(ma5, ma10, ma20)
        .ok_or_else(|| Exclusion::Computation("non-positive short moving average".into()))?;
    let volume_ratio = volume_ratio(last.volume as f64, volume_avg20)
        .ok_or_else(|| Exclusion::Computation("zero average volume".into()))?;
    let long_term_bias_pct = long_term_bias(ma60, ma240)
        .ok_or_else(|| Exclusion::Computation("non-positive MA240".into()))?;

    Ok(IndicatorSnapshot {
        date: last.date,
        close: last.close,
        volume: last.volume,
        ma5,
        ma10,
        ma20,
        ma60,
        ma60_earlier,
        ma240,
        volume_avg20,
        macd_histogram,
        macd_histogram_prev,
        convergence_pct,
        volume_ratio,
        long_term_bias_pct,
    })
}
