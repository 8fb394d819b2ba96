//! PriceBar: one daily OHLCV session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Shares per round lot on the Taiwan exchanges.
pub const SHARES_PER_LOT: u64 = 1000;

/// OHLCV bar for a single symbol on a single trading session.
///
/// Volume is expressed in shares, as delivered by the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, both bracket open and close, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Volume converted from shares to round lots.
    pub fn volume_lots(&self) -> f64 {
        self.volume as f64 / SHARES_PER_LOT as f64
    }
}
