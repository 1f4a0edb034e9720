//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: SMA of the first `period` values after any leading NaN run.

/// EMA of `values`; NaN until the seed window is complete.
///
/// Leading NaN values are skipped, so the EMA of another indicator's output
/// (which has its own NaN warmup) seeds at the first full window of valid values.
pub fn compute_ema(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }

    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => return result,
    };
    let seed_end = match start.checked_add(period) {
        Some(end) if end <= n => end,
        _ => return result,
    };

    let window = &values[start..seed_end];
    if window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = window.iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in seed_end..n {
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn ema_seeds_with_sma() {
        let result = compute_ema(&[10.0, 11.0, 12.0, 13.0], 3);
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        // alpha = 0.5: 0.5 * 13 + 0.5 * 11
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_skips_leading_nan() {
        let result = compute_ema(&[f64::NAN, f64::NAN, 2.0, 4.0, 6.0], 2);
        assert!(result[2].is_nan());
        assert_approx(result[3], 3.0, DEFAULT_EPSILON);
        // alpha = 2/3: 2/3 * 6 + 1/3 * 3
        assert_approx(result[4], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn oversized_period_is_all_nan() {
        let result = compute_ema(&[f64::NAN, 1.0, 2.0], usize::MAX);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
