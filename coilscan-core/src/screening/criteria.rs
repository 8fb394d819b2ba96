//! Screening thresholds, supplied per scan and fixed for its duration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaError {
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("bias range is inverted: min {min} > max {max}")]
    InvertedBiasRange { min: f64, max: f64 },
}

/// Inclusive band for the long-term bias, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasRange {
    pub min: f64,
    pub max: f64,
}

impl BiasRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Default for BiasRange {
    fn default() -> Self {
        Self {
            min: -5.0,
            max: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningCriteria {
    /// Maximum spread of MA5/MA10/MA20, in percent.
    pub convergence_limit_pct: f64,
    /// Maximum latest-volume / 20-day-average ratio.
    pub volume_ratio_limit: f64,
    /// Minimum latest volume, in round lots.
    pub min_volume_lots: f64,
    pub bias_range: BiasRange,
    pub use_bias_filter: bool,
    /// Require the last close above MA60.
    pub require_close_above_ma60: bool,
    /// Require MA60 to be higher than it was five bars earlier.
    pub require_ma60_rising: bool,
}

impl Default for ScreeningCriteria {
    fn default() -> Self {
        Self::base()
    }
}

impl ScreeningCriteria {
    /// Convergence and volume contraction only.
    pub fn base() -> Self {
        Self {
            convergence_limit_pct: 2.0,
            volume_ratio_limit: 1.0,
            min_volume_lots: 500.0,
            bias_range: BiasRange::default(),
            use_bias_filter: false,
            require_close_above_ma60: false,
            require_ma60_rising: false,
        }
    }

    /// Tighter thresholds plus the bias band and trend confirmation.
    pub fn stable() -> Self {
        Self {
            convergence_limit_pct: 1.5,
            volume_ratio_limit: 0.8,
            min_volume_lots: 1000.0,
            bias_range: BiasRange::default(),
            use_bias_filter: true,
            require_close_above_ma60: true,
            require_ma60_rising: true,
        }
    }

    pub fn validate(&self) -> Result<(), CriteriaError> {
        let thresholds = [
            ("convergence_limit_pct", self.convergence_limit_pct),
            ("volume_ratio_limit", self.volume_ratio_limit),
            ("min_volume_lots", self.min_volume_lots),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(CriteriaError::InvalidThreshold { field, value });
            }
        }

        if self.use_bias_filter {
            let BiasRange { min, max } = self.bias_range;
            if !min.is_finite() {
                return Err(CriteriaError::InvalidThreshold {
                    field: "bias_range.min",
                    value: min,
                });
            }
            if !max.is_finite() {
                return Err(CriteriaError::InvalidThreshold {
                    field: "bias_range.max",
                    value: max,
                });
            }
            if min > max {
                return Err(CriteriaError::InvertedBiasRange { min, max });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(ScreeningCriteria::base().validate().is_ok());
        assert!(ScreeningCriteria::stable().validate().is_ok());
    }

    #[test]
    fn negative_threshold_rejected() {
        let c = ScreeningCriteria {
            volume_ratio_limit: -0.1,
            ..ScreeningCriteria::base()
        };
        assert!(matches!(
            c.validate(),
            Err(CriteriaError::InvalidThreshold { field: "volume_ratio_limit", .. })
        ));
    }

    #[test]
    fn nan_threshold_rejected() {
        let c = ScreeningCriteria {
            convergence_limit_pct: f64::NAN,
            ..ScreeningCriteria::base()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn inverted_range_only_matters_when_enabled() {
        let mut c = ScreeningCriteria::base();
        c.bias_range = BiasRange { min: 10.0, max: -10.0 };
        assert!(c.validate().is_ok());
        c.use_bias_filter = true;
        assert!(matches!(c.validate(), Err(CriteriaError::InvertedBiasRange { .. })));
    }

    #[test]
    fn bias_range_is_inclusive() {
        let r = BiasRange { min: -5.0, max: 20.0 };
        assert!(r.contains(-5.0));
        assert!(r.contains(20.0));
        assert!(!r.contains(20.01));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c: ScreeningCriteria = toml::from_str("convergence_limit_pct = 1.2\nuse_bias_filter = true").unwrap();
        assert_eq!(c.convergence_limit_pct, 1.2);
        assert!(c.use_bias_filter);
        assert_eq!(c.volume_ratio_limit, ScreeningCriteria::base().volume_ratio_limit);
    }
}
