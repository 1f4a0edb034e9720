//! SuperTrend flip rule with trend-strength gate.
//!
//! `buy` when the trend flips down→up at the latest bar, `sell` on up→down,
//! `hold` otherwise. A flip is downgraded to `hold` when the window's trend
//! strength is below `trend_strength_filter`. Windows shorter than
//! `atr_period + 1` bars always yield `hold`.

use crate::domain::{PriceBar, StrategyParameters};
use crate::indicators::Trend;

use super::{trend_strength, Signal};

/// Evaluate the signal at the last bar of `window`.
///
/// `trend` is the SuperTrend direction series aligned with `window` (it may be
/// longer; only the first `window.len()` entries are consulted).
pub fn supertrend_signal(window: &[PriceBar], trend: &[Trend], params: &StrategyParameters) -> Signal {
    if window.len() < params.atr_period.saturating_add(1) || trend.len() < window.len() {
        return Signal::Hold;
    }
    let last = window.len() - 1;

    let flip = match (trend[last - 1], trend[last]) {
        (Trend::Down, Trend::Up) => Signal::Buy,
        (Trend::Up, Trend::Down) => Signal::Sell,
        _ => return Signal::Hold,
    };

    if params.trend_strength_filter > 0.0 && trend_strength(window) < params.trend_strength_filter
    {
        return Signal::Hold;
    }
    flip
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn params(atr_period: usize, filter: f64) -> StrategyParameters {
        StrategyParameters {
            atr_period,
            trend_strength_filter: filter,
            ..StrategyParameters::default()
        }
    }

    #[test]
    fn flip_up_is_buy() {
        let bars = make_bars(&[100.0, 99.0, 98.0, 105.0]);
        let trend = [Trend::Up, Trend::Down, Trend::Down, Trend::Up];
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.0)), Signal::Buy);
    }

    #[test]
    fn flip_down_is_sell() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 95.0]);
        let trend = [Trend::Up, Trend::Up, Trend::Up, Trend::Down];
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.0)), Signal::Sell);
    }

    #[test]
    fn steady_trend_is_hold() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0]);
        let trend = [Trend::Up; 4];
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.0)), Signal::Hold);
    }

    #[test]
    fn insufficient_history_is_hold() {
        let bars = make_bars(&[100.0, 95.0, 105.0]);
        let trend = [Trend::Up, Trend::Down, Trend::Up];
        // needs atr_period + 1 = 4 bars
        assert_eq!(supertrend_signal(&bars, &trend, &params(3, 0.0)), Signal::Hold);
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.0)), Signal::Buy);
    }

    #[test]
    fn oversized_period_holds() {
        let bars = make_bars(&[100.0, 99.0, 98.0, 105.0]);
        let trend = [Trend::Up, Trend::Down, Trend::Down, Trend::Up];
        assert_eq!(supertrend_signal(&bars, &trend, &params(usize::MAX, 0.0)), Signal::Hold);
    }

    #[test]
    fn filter_passes_or_blocks_around_the_strength() {
        // strength of this window is 0.15625
        let bars = crate::signal::strength::gapped_uptrend();
        let mut trend = vec![Trend::Up; bars.len()];
        *trend.last_mut().unwrap() = Trend::Down;

        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.15)), Signal::Sell);
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.16)), Signal::Hold);
        // the window alone would score 0.25 and pass 0.16
        assert_eq!(supertrend_signal(&bars[1..], &trend[1..], &params(2, 0.16)), Signal::Sell);
    }

    #[test]
    fn weak_trend_is_filtered() {
        // Fewer than 20 bars: strength is 0, so any positive filter blocks the flip.
        let bars = make_bars(&[100.0, 99.0, 98.0, 105.0]);
        let trend = [Trend::Up, Trend::Down, Trend::Down, Trend::Up];
        assert_eq!(supertrend_signal(&bars, &trend, &params(2, 0.1)), Signal::Hold);
    }
}
