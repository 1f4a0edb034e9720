//! PriceBar: the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV bar for one symbol and timeframe.
///
/// `timestamp` is milliseconds since the Unix epoch. A series is ordered
/// ascending by timestamp and never mutated once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Midpoint of the bar's range, `(high + low) / 2`.
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// A bar the engine can replay: finite fields and a positive close.
    pub fn is_tradeable(&self) -> bool {
        !self.is_void() && self.close > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar::new(1_704_153_600_000, 100.0, 105.0, 98.0, 103.0, 50_000.0)
    }

    #[test]
    fn mid_is_range_midpoint() {
        assert_eq!(sample_bar().mid(), 101.5);
    }

    #[test]
    fn detects_void_bar() {
        let mut bar = sample_bar();
        bar.high = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_tradeable());
    }

    #[test]
    fn zero_close_is_not_tradeable() {
        let mut bar = sample_bar();
        bar.close = 0.0;
        assert!(!bar.is_void());
        assert!(!bar.is_tradeable());
    }
}
