//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! Bar 0 has no previous close and seeds ATR at 0. While `i < period` the
//! value is a cumulative running average of the true ranges seen so far;
//! from `i >= period` on it switches to Wilder smoothing.

use crate::domain::PriceBar;

/// True Range series. TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(bars: &[PriceBar]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            tr.push(bar.high - bar.low);
        } else {
            let pc = bars[i - 1].close;
            tr.push(
                (bar.high - bar.low)
                    .max((bar.high - pc).abs())
                    .max((bar.low - pc).abs()),
            );
        }
    }
    tr
}

/// ATR series, index-aligned with `bars`.
///
/// `period` of 0 is treated as 1.
pub fn compute_atr(bars: &[PriceBar], period: usize) -> Vec<f64> {
    let period = period.max(1);
    let tr = true_range(bars);
    let mut atr = vec![0.0; bars.len()];

    for i in 1..bars.len() {
        atr[i] = if i < period {
            (atr[i - 1] * (i - 1) as f64 + tr[i]) / i as f64
        } else {
            (atr[i - 1] * (period - 1) as f64 + tr[i]) / period as f64
        };
    }

    atr
}
