//! Signal rules for the indicator-crossover and oscillator variants.

use crate::signal::Signal;

/// `buy` when `fast` crosses above `slow` at `i`, `sell` when it crosses below.
///
/// Needs finite values at `i - 1` and `i`; anything else is `hold`.
pub fn crossover(fast: &[f64], slow: &[f64], i: usize) -> Signal {
    if i == 0 || i >= fast.len() || i >= slow.len() {
        return Signal::Hold;
    }
    let (f0, f1, s0, s1) = (fast[i - 1], fast[i], slow[i - 1], slow[i]);
    if !(f0.is_finite() && f1.is_finite() && s0.is_finite() && s1.is_finite()) {
        return Signal::Hold;
    }
    if f0 <= s0 && f1 > s1 {
        Signal::Buy
    } else if f0 >= s0 && f1 < s1 {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// `buy` below `oversold`, `sell` above `overbought`.
pub fn rsi_levels(rsi: &[f64], i: usize, overbought: f64, oversold: f64) -> Signal {
    match rsi.get(i).copied() {
        Some(v) if v.is_finite() && v < oversold => Signal::Buy,
        Some(v) if v.is_finite() && v > overbought => Signal::Sell,
        _ => Signal::Hold,
    }
}
