//! SuperTrend: ATR bands with a ratchet.
//!
//! Inherently sequential: each final band depends on the previous final band,
//! so the series must be built in one forward pass.
//!
//! Ratchet rule, per bar `i > 0`:
//! - upper: take the basic band if it is lower than the previous final upper band
//!   or the previous close broke above that band; otherwise carry the band forward.
//! - lower: take the basic band if it is higher than the previous final lower band
//!   or the previous close broke below that band; otherwise carry the band forward.
//!
//! Bar 0 seeds both bands with the basic bands and the trend with `Up`.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// Prevailing SuperTrend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    #[default]
    Up,
    Down,
}

/// Final SuperTrend bands and direction, index-aligned with the bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperTrendBands {
    pub upper_band: Vec<f64>,
    pub lower_band: Vec<f64>,
    pub trend: Vec<Trend>,
}

impl SuperTrendBands {
    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Lower band (support) when trending up, upper band (resistance) when down.
    pub fn active_band(&self, i: usize) -> f64 {
        match self.trend[i] {
            Trend::Up => self.lower_band[i],
            Trend::Down => self.upper_band[i],
        }
    }
}

/// Compute SuperTrend bands from `bars` and a precomputed, index-aligned `atr`.
///
/// Only the first `min(bars.len(), atr.len())` bars are used.
pub fn compute_supertrend(bars: &[PriceBar], atr: &[f64], multiplier: f64) -> SuperTrendBands {
    let n = bars.len().min(atr.len());
    let mut upper_band = Vec::with_capacity(n);
    let mut lower_band = Vec::with_capacity(n);
    let mut trend = Vec::with_capacity(n);

    for i in 0..n {
        let mid = bars[i].mid();
        let basic_upper = mid + multiplier * atr[i];
        let basic_lower = mid - multiplier * atr[i];

        if i == 0 {
            upper_band.push(basic_upper);
            lower_band.push(basic_lower);
            trend.push(Trend::Up);
            continue;
        }

        let prev_close = bars[i - 1].close;
        let prev_upper = upper_band[i - 1];
        let prev_lower = lower_band[i - 1];

        let upper = if basic_upper < prev_upper || prev_close > prev_upper {
            basic_upper
        } else {
            prev_upper
        };
        let lower = if basic_lower > prev_lower || prev_close < prev_lower {
            basic_lower
        } else {
            prev_lower
        };

        let close = bars[i].close;
        let next = match trend[i - 1] {
            Trend::Down if close > upper => Trend::Up,
            Trend::Up if close < lower => Trend::Down,
            held => held,
        };

        upper_band.push(upper);
        lower_band.push(lower);
        trend.push(next);
    }

    SuperTrendBands {
        upper_band,
        lower_band,
        trend,
    }
}
