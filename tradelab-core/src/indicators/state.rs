//! Per-bar SuperTrend indicator state.

use serde::{Deserialize, Serialize};

use super::{compute_atr, compute_supertrend, Trend};
use crate::domain::PriceBar;

/// ATR plus final SuperTrend bands and direction, index-aligned with the bars.
///
/// Bars before `atr_period` hold the seed values produced by the running-average
/// ATR; they are defined but not reliable for trading decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorState {
    pub atr: Vec<f64>,
    pub upper_band: Vec<f64>,
    pub lower_band: Vec<f64>,
    pub trend: Vec<Trend>,
}

impl IndicatorState {
    pub fn compute(bars: &[PriceBar], atr_period: usize, multiplier: f64) -> Self {
        let atr = compute_atr(bars, atr_period);
        let bands = compute_supertrend(bars, &atr, multiplier);
        Self {
            atr,
            upper_band: bands.upper_band,
            lower_band: bands.lower_band,
            trend: bands.trend,
        }
    }

    pub fn len(&self) -> usize {
        self.atr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atr.is_empty()
    }
}
