//! MACD: fast EMA minus slow EMA, with an EMA signal line.

use super::ema::compute_ema;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacdLines {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

pub fn compute_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdLines {
    let fast_ema = compute_ema(closes, fast);
    let slow_ema = compute_ema(closes, slow);
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal = compute_ema(&macd, signal);
    MacdLines { macd, signal }
}
