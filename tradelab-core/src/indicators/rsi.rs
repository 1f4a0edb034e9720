//! Relative Strength Index (RSI), simple-average form.
//!
//! Average gain and average loss are plain means over the last `period`
//! close-to-close changes (no Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Edge cases: avg_loss == 0 → 100.

/// RSI of `closes`; NaN until `period` changes are available (index `period`).
pub fn compute_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period.saturating_add(1) {
        return result;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for i in period..n {
        // changes[j] is the move into bar j + 1
        let window = &changes[i - period..i];
        let gains: f64 = window.iter().filter(|&&c| c > 0.0).sum();
        let losses: f64 = window.iter().filter(|&&c| c < 0.0).map(|c| -c).sum();
        result[i] = rsi_value(gains / period as f64, losses / period as f64);
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn all_gains_is_100() {
        let result = compute_rsi(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn all_losses_is_0() {
        let result = compute_rsi(&[4.0, 3.0, 2.0, 1.0], 3);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn balanced_moves_is_50() {
        let result = compute_rsi(&[10.0, 12.0, 10.0], 2);
        assert_approx(result[2], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn oversized_period_is_all_nan() {
        assert!(compute_rsi(&[1.0, 2.0, 3.0], usize::MAX).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn window_rolls() {
        // changes: +2, -2, +1 → last two: -2, +1 → gain 0.5, loss 1.0
        let result = compute_rsi(&[10.0, 12.0, 10.0, 11.0], 2);
        assert_approx(result[3], 100.0 - 100.0 / 1.5, DEFAULT_EPSILON);
    }
}
