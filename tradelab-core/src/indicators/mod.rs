//! Indicator library.
//!
//! Every indicator is a pure function over a bar (or value) series that returns
//! an index-aligned output of the same length. Values at index `i` depend only
//! on inputs `0..=i`, so a series computed once up front gives the same per-bar
//! value as recomputing it over the window ending at `i`.
//!
//! ATR and SuperTrend seed their warmup bars with defined values. The moving
//! average family (SMA, EMA, RSI, MACD) fills warmup bars with NaN.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod state;
pub mod supertrend;

pub use atr::{compute_atr, true_range};
pub use ema::compute_ema;
pub use macd::{compute_macd, MacdLines};
pub use rsi::compute_rsi;
pub use sma::compute_sma;
pub use state::IndicatorState;
pub use supertrend::{compute_supertrend, SuperTrendBands, Trend};

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar::new(
                i as i64 * 60_000,
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            PriceBar::new(i as i64 * 60_000, open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
