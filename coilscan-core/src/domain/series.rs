//! Series: the validated, date-ordered bar history of one symbol.

use super::bar::PriceBar;
use serde::Serialize;
use thiserror::Error;

/// Violations of the series ordering invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} on {date} is not after the previous bar")]
    OutOfOrder { index: usize, date: chrono::NaiveDate },

    #[error("bar {index} on {date} has a non-finite close")]
    NonFiniteClose { index: usize, date: chrono::NaiveDate },
}

/// Ordered sequence of bars for one symbol, ascending by date.
///
/// Dates are strictly increasing (no duplicates). Volume is non-negative by type.
/// Construct through [`Series::new`], or run raw provider output through
/// [`canonicalize`] first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl Series {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() {
                return Err(SeriesError::NonFiniteClose {
                    index,
                    date: bar.date,
                });
            }
            if index > 0 && bar.date <= bars[index - 1].date {
                return Err(SeriesError::OutOfOrder {
                    index,
                    date: bar.date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// A new series holding only the first `len` bars.
    pub fn truncated(&self, len: usize) -> Series {
        Series {
            symbol: self.symbol.clone(),
            bars: self.bars[..len.min(self.bars.len())].to_vec(),
        }
    }
}

/// Sort by date, drop duplicate dates (first occurrence wins) and drop bars
/// whose close is missing.
pub fn canonicalize(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite());
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}
