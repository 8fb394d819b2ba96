//! Breakout classifier: thresholds in, match/no-match plus labels out.
//!
//! The classifier is a pure function of (snapshot, criteria). Ordering of hits
//! is not its concern; result sets sort after collection.

use super::criteria::ScreeningCriteria;
use super::snapshot::{compute_snapshot, Exclusion, IndicatorSnapshot};
use crate::domain::{Board, Listing, Series};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where price sits relative to the long-term average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionLabel {
    /// Close above MA240: no long-term overhead supply.
    UptrendClear,
    /// Close at or below MA240: the long-term average still overhangs price.
    BasingBelowLongTerm,
}

impl fmt::Display for PositionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionLabel::UptrendClear => write!(f, "uptrend/long-term-clear"),
            PositionLabel::BasingBelowLongTerm => {
                write!(f, "basing/resistance-at-long-term-average")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumLabel {
    /// MACD histogram higher than on the previous bar.
    Strengthening,
    Consolidating,
}

impl fmt::Display for MomentumLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentumLabel::Strengthening => write!(f, "strengthening"),
            MomentumLabel::Consolidating => write!(f, "consolidating"),
        }
    }
}

/// A matched symbol. Percentages and ratios are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHit {
    pub symbol: String,
    pub name: String,
    pub board: Board,
    pub date: chrono::NaiveDate,
    pub price: f64,
    pub convergence_pct: f64,
    pub volume_ratio: f64,
    pub long_term_bias_pct: f64,
    pub volume_lots: f64,
    pub position: PositionLabel,
    pub momentum: MomentumLabel,
}

/// Outcome of screening one series.
#[derive(Debug, Clone, PartialEq)]
pub enum Screening {
    Hit(ScanHit),
    NoMatch,
    Excluded(Exclusion),
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether the snapshot satisfies every enabled condition. Compares unrounded values.
pub fn matches(snapshot: &IndicatorSnapshot, criteria: &ScreeningCriteria) -> bool {
    if snapshot.convergence_pct > criteria.convergence_limit_pct {
        return false;
    }
    if snapshot.volume_ratio > criteria.volume_ratio_limit {
        return false;
    }
    if criteria.use_bias_filter && !criteria.bias_range.contains(snapshot.long_term_bias_pct) {
        return false;
    }
    if criteria.require_close_above_ma60 && snapshot.close <= snapshot.ma60 {
        return false;
    }
    if criteria.require_ma60_rising && !snapshot.ma60_rising() {
        return false;
    }
    true
}

pub fn position_label(snapshot: &IndicatorSnapshot) -> PositionLabel {
    if snapshot.above_long_term() {
        PositionLabel::UptrendClear
    } else {
        PositionLabel::BasingBelowLongTerm
    }
}

pub fn momentum_label(snapshot: &IndicatorSnapshot) -> MomentumLabel {
    if snapshot.momentum_strengthening() {
        MomentumLabel::Strengthening
    } else {
        MomentumLabel::Consolidating
    }
}

/// Classify a snapshot. `None` when any enabled condition fails.
pub fn classify(
    listing: &Listing,
    snapshot: &IndicatorSnapshot,
    criteria: &ScreeningCriteria,
) -> Option<ScanHit> {
    if !matches(snapshot, criteria) {
        return None;
    }

    Some(ScanHit {
        symbol: listing.code.clone(),
        name: listing.name.clone(),
        board: listing.board,
        date: snapshot.date,
        price: round2(snapshot.close),
        convergence_pct: round2(snapshot.convergence_pct),
        volume_ratio: round2(snapshot.volume_ratio),
        long_term_bias_pct: round2(snapshot.long_term_bias_pct),
        volume_lots: snapshot.volume_lots().round(),
        position: position_label(snapshot),
        momentum: momentum_label(snapshot),
    })
}

/// Snapshot plus classification for one fetched series.
pub fn screen_series(listing: &Listing, series: &Series, criteria: &ScreeningCriteria) -> Screening {
    match compute_snapshot(series, criteria.min_volume_lots) {
        Ok(snapshot) => match classify(listing, &snapshot, criteria) {
            Some(hit) => Screening::Hit(hit),
            None => Screening::NoMatch,
        },
        Err(exclusion) => Screening::Excluded(exclusion),
    }
}
