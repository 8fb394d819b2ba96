//! Breakout screening: indicator snapshot, thresholds and classifier.

pub mod classifier;
pub mod criteria;
pub mod snapshot;

pub use classifier::{
    classify, matches, round2, screen_series, MomentumLabel, PositionLabel, ScanHit, Screening,
};
pub use criteria::{BiasRange, CriteriaError, ScreeningCriteria};
pub use snapshot::{
    compute_snapshot, convergence_gap, long_term_bias, volume_ratio, Exclusion,
    IndicatorSnapshot, MIN_BARS,
};
