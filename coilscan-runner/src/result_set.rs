//! Result set: the hits of one scan plus its aggregate summary.
//!
//! Hits are ordered ascending by convergence gap (tightest coil first), ties
//! broken by symbol, regardless of the order workers finished in.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use coilscan_core::screening::{Exclusion, ScanHit};
use serde::{Deserialize, Serialize};

/// Why a candidate produced no hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    DataUnavailable,
    InsufficientHistory,
    LiquidityFiltered,
    ComputationError,
    NoMatch,
    Cancelled,
}

impl SkipReason {
    pub const ALL: [SkipReason; 6] = [
        SkipReason::DataUnavailable,
        SkipReason::InsufficientHistory,
        SkipReason::LiquidityFiltered,
        SkipReason::ComputationError,
        SkipReason::NoMatch,
        SkipReason::Cancelled,
    ];
}

impl From<&Exclusion> for SkipReason {
    fn from(exclusion: &Exclusion) -> Self {
        match exclusion {
            Exclusion::InsufficientHistory { .. } => SkipReason::InsufficientHistory,
            Exclusion::LiquidityFiltered { .. } => SkipReason::LiquidityFiltered,
            Exclusion::Computation(_) => SkipReason::ComputationError,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::DataUnavailable => "data unavailable",
            SkipReason::InsufficientHistory => "insufficient history",
            SkipReason::LiquidityFiltered => "liquidity filtered",
            SkipReason::ComputationError => "computation error",
            SkipReason::NoMatch => "no match",
            SkipReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Aggregate outcome of a scan. Only counts are kept per skip reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub processed: usize,
    pub hits: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl ScanSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_hit(&mut self) {
        self.processed += 1;
        self.hits += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.processed += 1;
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {}, found {} matches, elapsed {:.1}s",
            self.processed,
            self.hits,
            self.elapsed.as_secs_f64()
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Alternative orderings for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Convergence,
    VolumeRatio,
    LongTermBias,
    Symbol,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "convergence" => Ok(SortKey::Convergence),
            "volume" | "volume_ratio" => Ok(SortKey::VolumeRatio),
            "bias" | "long_term_bias" => Ok(SortKey::LongTermBias),
            "symbol" => Ok(SortKey::Symbol),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

fn compare(a: &ScanHit, b: &ScanHit, key: SortKey) -> std::cmp::Ordering {
    let primary = match key {
        SortKey::Convergence => a.convergence_pct.total_cmp(&b.convergence_pct),
        SortKey::VolumeRatio => a.volume_ratio.total_cmp(&b.volume_ratio),
        SortKey::LongTermBias => a.long_term_bias_pct.total_cmp(&b.long_term_bias_pct),
        SortKey::Symbol => std::cmp::Ordering::Equal,
    };
    primary.then_with(|| a.symbol.cmp(&b.symbol))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    hits: Vec<ScanHit>,
    summary: ScanSummary,
}

impl ResultSet {
    pub fn new(mut hits: Vec<ScanHit>, summary: ScanSummary) -> Self {
        hits.sort_by(|a, b| compare(a, b, SortKey::Convergence));
        Self { hits, summary }
    }

    pub fn empty(summary: ScanSummary) -> Self {
        Self::new(Vec::new(), summary)
    }

    pub fn hits(&self) -> &[ScanHit] {
        &self.hits
    }

    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&ScanHit> {
        self.hits.iter().find(|h| h.symbol == symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.hits.iter().map(|h| h.symbol.as_str())
    }

    /// Hits in an alternative order; the set itself keeps convergence order.
    pub fn sorted_by(&self, key: SortKey) -> Vec<&ScanHit> {
        let mut view: Vec<&ScanHit> = self.hits.iter().collect();
        view.sort_by(|a, b| compare(a, b, key));
        view
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use coilscan_core::domain::Board;
    use coilscan_core::screening::{MomentumLabel, PositionLabel};

    fn hit(symbol: &str, convergence_pct: f64, volume_ratio: f64) -> ScanHit {
        ScanHit {
            symbol: symbol.into(),
            name: String::new(),
            board: Board::Twse,
            date: NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
            price: 50.0,
            convergence_pct,
            volume_ratio,
            long_term_bias_pct: 1.0,
            volume_lots: 800.0,
            position: PositionLabel::UptrendClear,
            momentum: MomentumLabel::Consolidating,
        }
    }

    #[test]
    fn hits_sorted_by_convergence_then_symbol() {
        let set = ResultSet::new(
            vec![hit("2603", 1.2, 0.5), hit("1101", 0.4, 0.9), hit("2002", 1.2, 0.3)],
            ScanSummary::new(3),
        );
        let order: Vec<&str> = set.symbols().collect();
        assert_eq!(order, vec!["1101", "2002", "2603"]);
    }

    #[test]
    fn alternative_sort_keeps_set_order() {
        let set = ResultSet::new(
            vec![hit("2603", 1.2, 0.5), hit("1101", 0.4, 0.9), hit("2002", 1.2, 0.3)],
            ScanSummary::new(3),
        );
        let by_volume: Vec<&str> = set
            .sorted_by(SortKey::VolumeRatio)
            .iter()
            .map(|h| h.symbol.as_str())
            .collect();
        assert_eq!(by_volume, vec!["2002", "2603", "1101"]);
        assert_eq!(set.hits()[0].symbol, "1101");
    }

    #[test]
    fn summary_counts_and_display() {
        let mut summary = ScanSummary::new(4);
        summary.record_hit();
        summary.record_skip(SkipReason::NoMatch);
        summary.record_skip(SkipReason::NoMatch);
        summary.record_skip(SkipReason::DataUnavailable);
        summary.elapsed = Duration::from_millis(2_340);

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.skipped_for(SkipReason::NoMatch), 2);
        assert_eq!(summary.skipped_for(SkipReason::Cancelled), 0);
        assert_eq!(summary.to_string(), "scanned 4, found 1 matches, elapsed 2.3s");
    }

    #[test]
    fn exclusions_map_to_skip_reasons() {
        let e = Exclusion::InsufficientHistory {
            bars: 10,
            required: 245,
        };
        assert_eq!(SkipReason::from(&e), SkipReason::InsufficientHistory);
        assert_eq!(
            SkipReason::from(&Exclusion::Computation("x".into())),
            SkipReason::ComputationError
        );
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("Volume".parse::<SortKey>(), Ok(SortKey::VolumeRatio));
        assert!("price".parse::<SortKey>().is_err());
    }

    proptest::proptest! {
        #[test]
        fn order_ignores_input_order(
            rows in proptest::collection::vec((1000u32..1100, 0u32..300), 1..30),
            seed in 0usize..1000,
        ) {
            let hits: Vec<ScanHit> = rows
                .iter()
                .map(|(code, conv)| hit(&code.to_string(), *conv as f64 / 100.0, 1.0))
                .collect();
            let mut rotated = hits.clone();
            let shift = seed % rotated.len();
            rotated.rotate_left(shift);
            rotated.reverse();

            let a = ResultSet::new(hits, ScanSummary::default());
            let b = ResultSet::new(rotated, ScanSummary::default());
            proptest::prop_assert_eq!(a.hits(), b.hits());
            for pair in a.hits().windows(2) {
                proptest::prop_assert!(pair[0].convergence_pct <= pair[1].convergence_pct);
            }
        }
    }
}
