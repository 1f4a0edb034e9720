//! Trend-strength score in [0, 1].
//!
//! Mean absolute close-to-close percentage change over the last
//! `TREND_STRENGTH_LOOKBACK` bars, divided by the mean true range of those
//! bars expressed as a percentage of their close. True range of the first
//! window bar uses the close before the window when there is one, and falls
//! back to its high-low range otherwise. Changes are taken within the window.

use crate::domain::PriceBar;
use crate::indicators::true_range;

pub const TREND_STRENGTH_LOOKBACK: usize = 20;

/// Trend strength of the window ending at the last bar of `bars`.
///
/// Returns 0.0 with fewer than `TREND_STRENGTH_LOOKBACK` bars or when the
/// mean true range is zero.
pub fn trend_strength(bars: &[PriceBar]) -> f64 {
    if bars.len() < TREND_STRENGTH_LOOKBACK {
        return 0.0;
    }
    let window = &bars[bars.len() - TREND_STRENGTH_LOOKBACK..];

    let changes: Vec<f64> = window
        .windows(2)
        .map(|w| {
            if w[0].close != 0.0 {
                ((w[1].close - w[0].close) / w[0].close * 100.0).abs()
            } else {
                0.0
            }
        })
        .collect();
    let mean_change = changes.iter().sum::<f64>() / changes.len() as f64;

    // one bar of context so the first window bar sees its previous close
    let context = &bars[bars.len().saturating_sub(TREND_STRENGTH_LOOKBACK + 1)..];
    let tr = true_range(context);
    let tr = &tr[tr.len() - TREND_STRENGTH_LOOKBACK..];
    let mean_range_pct = window
        .iter()
        .zip(tr)
        .map(|(bar, tr)| if bar.close != 0.0 { tr / bar.close * 100.0 } else { 0.0 })
        .sum::<f64>()
        / window.len() as f64;

    if !(mean_range_pct.is_finite() && mean_range_pct > 0.0) {
        return 0.0;
    }
    let strength = mean_change / mean_range_pct;
    if strength.is_finite() {
        strength.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// One bar at 50 followed by 20 bars rising exactly 1% per bar with a 4%
/// high-low range. Strength of the last 20 bars is 1 / 6.4: changes average 1%,
/// true range is 4% everywhere except the first window bar, which gaps up from
/// 50 to a high of 102 (52%).
#[cfg(test)]
pub(crate) fn gapped_uptrend() -> Vec<PriceBar> {
    let mut data = vec![(50.0, 51.0, 49.0, 50.0)];
    data.extend((0..TREND_STRENGTH_LOOKBACK as i32).map(|k| {
        let c = 100.0 * 1.01_f64.powi(k);
        (c, c * 1.02, c * 0.98, c)
    }));
    crate::indicators::make_ohlc_bars(&data)
}
