//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        sma_of_series(&closes, self.period)
    }
}

/// Mean of `values` over the window. Each window is summed on its own so a
/// run of equal values averages to exactly that value.
/// Any NaN inside a window makes that window NaN.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for (i, slot) in result.iter_mut().enumerate().skip(period - 1) {
        *slot = window_mean(&values[i + 1 - period..=i]);
    }
    result
}

/// Mean of the `period` values ending `offset` positions before the last one.
///
/// `None` when there are not enough values or the window holds a NaN.
pub fn sma_at(values: &[f64], period: usize, offset: usize) -> Option<f64> {
    let end = values.len().checked_sub(offset)?;
    let start = end.checked_sub(period)?;
    if period == 0 {
        return None;
    }
    let mean = window_mean(&values[start..end]);
    (!mean.is_nan()).then_some(mean)
}

fn window_mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}
