//! Synthetic series fetcher: developer/demo mode.
//!
//! Generates a deterministic random walk per symbol (seeded from the BLAKE3
//! hash of the code) so scans can be exercised offline. Results produced on
//! synthetic data must never be mistaken for market data; the CLI tags them.

use super::provider::{DataError, SeriesFetcher};
use crate::domain::{Listing, PriceBar, Series};
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticFetcher {
    end: NaiveDate,
}

impl SyntheticFetcher {
    /// Series end on today's date.
    pub fn new() -> Self {
        Self {
            end: Utc::now().date_naive(),
        }
    }

    /// Series end on a fixed date, for reproducible output.
    pub fn ending_on(end: NaiveDate) -> Self {
        Self { end }
    }

    pub fn generate(&self, code: &str, lookback_days: u32) -> Vec<PriceBar> {
        let seed: [u8; 32] = *blake3::hash(code.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let start = self.end - Duration::days(i64::from(lookback_days));
        let mut price: f64 = rng.gen_range(20.0..600.0);
        let base_volume: u64 = rng.gen_range(200_000..20_000_000);
        let mut bars = Vec::new();
        let mut current = start;

        while current <= self.end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.025..0.0265);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = (base_volume as f64 * rng.gen_range(0.4..1.8)) as u64;

            bars.push(PriceBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += Duration::days(1);
        }

        bars
    }
}

impl Default for SyntheticFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesFetcher for SyntheticFetcher {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, listing: &Listing, lookback_days: u32) -> Result<Series, DataError> {
        let bars = self.generate(&listing.code, lookback_days);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: listing.code.clone(),
            });
        }
        Ok(Series::new(listing.code.clone(), bars)?)
    }
}
