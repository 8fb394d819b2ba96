//! MACD momentum histogram.
//!
//! momentum line = EWM(fast) - EWM(slow) of close
//! signal line   = EWM(signal) of the momentum line
//! histogram     = momentum line - signal line

use super::ema::ewm_of_series;
use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdOutput {
    /// Histogram at the last bar and at the bar before it.
    pub fn last_two_histogram(&self) -> Option<(f64, f64)> {
        let n = self.histogram.len();
        if n < 2 {
            return None;
        }
        Some((self.histogram[n - 1], self.histogram[n - 2]))
    }
}

impl Macd {
    pub fn compute_series(&self, closes: &[f64]) -> MacdOutput {
        let fast = ewm_of_series(closes, self.fast);
        let slow = ewm_of_series(closes, self.slow);
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ewm_of_series(&line, self.signal);
        let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
        MacdOutput {
            line,
            signal,
            histogram,
        }
    }

    pub fn compute(&self, bars: &[PriceBar]) -> MacdOutput {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        self.compute_series(&closes)
    }
}
