//! Property tests for screening invariants.
//!
//! Uses proptest to verify:
//! 1. Convergence gap is non-negative and ignores argument order
//! 2. Volume ratio scales linearly with the latest volume
//! 3. Loosening any threshold never turns a hit into a miss
//! 4. Classification is idempotent
//! 5. Canonicalized bars always build a valid series

use chrono::NaiveDate;
use coilscan_core::domain::{canonicalize, Board, Listing, PriceBar, Series};
use coilscan_core::screening::{
    classify, convergence_gap, matches, volume_ratio, BiasRange, IndicatorSnapshot,
    ScreeningCriteria,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    1.0..1000.0_f64
}

fn arb_snapshot() -> impl Strategy<Value = IndicatorSnapshot> {
    (
        arb_price(),
        arb_price(),
        0.0..5.0_f64,
        0.0..3.0_f64,
        -30.0..40.0_f64,
        (0.9..1.1_f64, -1.0..1.0_f64, -1.0..1.0_f64),
        0u64..5_000_000,
    )
        .prop_map(
            |(close, ma60, convergence_pct, volume_ratio, bias, (slope, h, h_prev), volume)| {
                IndicatorSnapshot {
                    date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
                    close,
                    volume,
                    ma5: close,
                    ma10: close,
                    ma20: close,
                    ma60,
                    ma60_earlier: ma60 * slope,
                    ma240: ma60 / (1.0 + bias / 100.0),
                    volume_avg20: 1_000_000.0,
                    macd_histogram: h,
                    macd_histogram_prev: h_prev,
                    convergence_pct,
                    volume_ratio,
                    long_term_bias_pct: bias,
                }
            },
        )
}

fn arb_criteria() -> impl Strategy<Value = ScreeningCriteria> {
    (
        0.0..5.0_f64,
        0.0..3.0_f64,
        (-20.0..0.0_f64, 0.0..30.0_f64),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(conv, vol, (min, max), bias_on, above, rising)| ScreeningCriteria {
            convergence_limit_pct: conv,
            volume_ratio_limit: vol,
            min_volume_lots: 0.0,
            bias_range: BiasRange { min, max },
            use_bias_filter: bias_on,
            require_close_above_ma60: above,
            require_ma60_rising: rising,
        })
}

fn listing() -> Listing {
    Listing::equity("2317", "鴻海", Board::Twse)
}

// ── 1. Convergence gap ───────────────────────────────────────────────

proptest! {
    #[test]
    fn convergence_is_non_negative(a in arb_price(), b in arb_price(), c in arb_price()) {
        let gap = convergence_gap(a, b, c).unwrap();
        prop_assert!(gap >= 0.0);
    }

    #[test]
    fn convergence_ignores_order(a in arb_price(), b in arb_price(), c in arb_price()) {
        let reference = convergence_gap(a, b, c).unwrap();
        for (x, y, z) in [(a, c, b), (b, a, c), (b, c, a), (c, a, b), (c, b, a)] {
            prop_assert_eq!(convergence_gap(x, y, z).unwrap(), reference);
        }
    }

    #[test]
    fn equal_averages_have_zero_gap(a in arb_price()) {
        prop_assert_eq!(convergence_gap(a, a, a), Some(0.0));
    }
}

// ── 2. Volume ratio ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn doubling_latest_volume_doubles_ratio(
        latest in 1.0..1e8_f64,
        average in 1.0..1e8_f64,
    ) {
        let single = volume_ratio(latest, average).unwrap();
        let double = volume_ratio(latest * 2.0, average).unwrap();
        prop_assert!((double - 2.0 * single).abs() <= 1e-9 * double.max(1.0));
    }
}

// ── 3. Monotonicity in thresholds ────────────────────────────────────

proptest! {
    #[test]
    fn loosening_limits_keeps_hits(
        snapshot in arb_snapshot(),
        criteria in arb_criteria(),
        extra_conv in 0.0..2.0_f64,
        extra_vol in 0.0..2.0_f64,
        widen in 0.0..10.0_f64,
    ) {
        prop_assume!(matches(&snapshot, &criteria));

        let looser = ScreeningCriteria {
            convergence_limit_pct: criteria.convergence_limit_pct + extra_conv,
            volume_ratio_limit: criteria.volume_ratio_limit + extra_vol,
            bias_range: BiasRange {
                min: criteria.bias_range.min - widen,
                max: criteria.bias_range.max + widen,
            },
            ..criteria.clone()
        };
        prop_assert!(matches(&snapshot, &looser));
    }

    #[test]
    fn disabling_a_condition_keeps_hits(
        snapshot in arb_snapshot(),
        criteria in arb_criteria(),
    ) {
        prop_assume!(matches(&snapshot, &criteria));

        for relaxed in [
            ScreeningCriteria { use_bias_filter: false, ..criteria.clone() },
            ScreeningCriteria { require_close_above_ma60: false, ..criteria.clone() },
            ScreeningCriteria { require_ma60_rising: false, ..criteria.clone() },
        ] {
            prop_assert!(matches(&snapshot, &relaxed));
        }
    }

    #[test]
    fn tightening_convergence_below_value_rejects(
        snapshot in arb_snapshot(),
        criteria in arb_criteria(),
    ) {
        prop_assume!(snapshot.convergence_pct > 0.01);
        let tight = ScreeningCriteria {
            convergence_limit_pct: snapshot.convergence_pct - 0.01,
            ..criteria
        };
        prop_assert!(!matches(&snapshot, &tight));
    }
}

// ── 4. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn classification_is_idempotent(
        snapshot in arb_snapshot(),
        criteria in arb_criteria(),
    ) {
        let first = classify(&listing(), &snapshot, &criteria);
        let second = classify(&listing(), &snapshot, &criteria);
        prop_assert_eq!(first.is_some(), matches(&snapshot, &criteria));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn reported_values_have_two_decimals(
        snapshot in arb_snapshot(),
        criteria in arb_criteria(),
    ) {
        if let Some(hit) = classify(&listing(), &snapshot, &criteria) {
            for value in [hit.price, hit.convergence_pct, hit.volume_ratio, hit.long_term_bias_pct] {
                let scaled = value * 100.0;
                prop_assert!((scaled - scaled.round()).abs() < 1e-6);
            }
        }
    }
}

// ── 5. Canonicalization ──────────────────────────────────────────────

proptest! {
    #[test]
    fn canonical_bars_form_valid_series(
        offsets in prop::collection::vec(0i64..400, 0..120),
        closes in prop::collection::vec(prop_oneof![arb_price(), Just(f64::NAN)], 120),
    ) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars: Vec<PriceBar> = offsets
            .iter()
            .zip(&closes)
            .map(|(&d, &close)| PriceBar {
                date: base + chrono::Duration::days(d),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect();

        let canonical = canonicalize(bars);
        prop_assert!(canonical.windows(2).all(|w| w[0].date < w[1].date));
        prop_assert!(canonical.iter().all(|b| b.close.is_finite()));
        prop_assert!(Series::new("2317", canonical).is_ok());
    }
}
