//! Exponentially weighted mean.
//!
//! Recursive: EWM[t] = alpha * x[t] + (1 - alpha) * EWM[t-1], alpha = 2 / (span + 1),
//! seeded with the first value and valid from index 0. This is the
//! non-adjusted form the momentum histogram is built on.

/// First-value-seeded exponentially weighted mean with the given span.
///
/// Leading NaNs are skipped; the first finite value seeds the recursion. A NaN
/// after the seed taints every later value.
pub fn ewm_of_series(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let mut prev = values[start];
    result[start] = prev;
    for i in (start + 1)..n {
        if values[i].is_nan() {
            return result;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ewm_seeds_with_first_value() {
        // alpha = 0.5
        let result = ewm_of_series(&[10.0, 12.0, 14.0], 3);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 11.0, DEFAULT_EPSILON);
        assert_approx(result[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_skips_leading_nan() {
        let result = ewm_of_series(&[f64::NAN, f64::NAN, 4.0, 8.0], 3);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 4.0, DEFAULT_EPSILON);
        assert_approx(result[3], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_of_constant_is_constant() {
        let result = ewm_of_series(&[7.5; 40], 26);
        assert!(result.iter().all(|&v| (v - 7.5).abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn ewm_no_lookahead() {
        let values: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.3).cos() * 4.0).collect();
        let full = ewm_of_series(&values, 12);
        let truncated = ewm_of_series(&values[..35], 12);
        for i in 0..35 {
            assert_approx(full[i], truncated[i], DEFAULT_EPSILON);
        }
    }
}
