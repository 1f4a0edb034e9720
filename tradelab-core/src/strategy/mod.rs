//! Strategy variants.
//!
//! A `Strategy` pairs the shared `StrategyParameters` with one variant's own
//! settings. `prepare()` computes every indicator the variant needs once over
//! the full bar series; the resulting `PreparedStrategy` answers per-bar
//! signal queries without recomputation. Because every indicator is causal,
//! `signal_at(bars, i)` equals the signal computed from the window `bars[..=i]`.

pub mod registry;
pub mod rules;

use serde::{Deserialize, Serialize};

use crate::domain::{PriceBar, StrategyParameters};
use crate::indicators::{compute_macd, compute_rsi, compute_sma, IndicatorState, MacdLines};
use crate::signal::{supertrend_signal, Signal};

pub use registry::{StrategyConstructor, StrategyRegistry};

/// Variant-specific settings. One arm per supported strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StrategyVariant {
    SuperTrend,
    #[serde(rename_all = "camelCase")]
    MovingAverage {
        short_period: usize,
        long_period: usize,
    },
    #[serde(rename_all = "camelCase")]
    Rsi {
        period: usize,
        overbought: f64,
        oversold: f64,
    },
    #[serde(rename_all = "camelCase")]
    Macd {
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    },
}

impl StrategyVariant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SuperTrend => "SuperTrend",
            Self::MovingAverage { .. } => "MovingAverage",
            Self::Rsi { .. } => "RSI",
            Self::Macd { .. } => "MACD",
        }
    }

    /// Map keys the variant decodes on top of the shared parameters.
    pub fn parameter_keys(&self) -> &'static [&'static str] {
        match self {
            Self::SuperTrend => &[],
            Self::MovingAverage { .. } => &["shortPeriod", "longPeriod"],
            Self::Rsi { .. } => &["rsiPeriod", "overbought", "oversold"],
            Self::Macd { .. } => &["fastPeriod", "slowPeriod", "signalPeriod"],
        }
    }
}

/// A fully-configured strategy, ready to be prepared against a bar series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub variant: StrategyVariant,
    pub params: StrategyParameters,
}

impl Strategy {
    pub fn new(variant: StrategyVariant, params: StrategyParameters) -> Self {
        Self { variant, params }
    }

    pub fn name(&self) -> &'static str {
        self.variant.name()
    }

    /// Whether `key` in a parameter map has any effect on this strategy.
    pub fn reads_parameter(&self, key: &str) -> bool {
        StrategyParameters::KEYS.contains(&key) || self.variant.parameter_keys().contains(&key)
    }

    /// Precompute the variant's indicators over the whole series.
    pub fn prepare(&self, bars: &[PriceBar]) -> PreparedStrategy {
        let closes = || bars.iter().map(|b| b.close).collect::<Vec<f64>>();
        let series = match self.variant {
            StrategyVariant::SuperTrend => PreparedSeries::SuperTrend(IndicatorState::compute(
                bars,
                self.params.atr_period,
                self.params.multiplier,
            )),
            StrategyVariant::MovingAverage {
                short_period,
                long_period,
            } => {
                let closes = closes();
                PreparedSeries::MovingAverage {
                    short: compute_sma(&closes, short_period),
                    long: compute_sma(&closes, long_period),
                }
            }
            StrategyVariant::Rsi {
                period,
                overbought,
                oversold,
            } => PreparedSeries::Rsi {
                rsi: compute_rsi(&closes(), period),
                overbought,
                oversold,
            },
            StrategyVariant::Macd {
                fast_period,
                slow_period,
                signal_period,
            } => PreparedSeries::Macd(compute_macd(
                &closes(),
                fast_period,
                slow_period,
                signal_period,
            )),
        };
        PreparedStrategy {
            strategy: *self,
            series,
        }
    }
}

/// Indicator output for one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedSeries {
    SuperTrend(IndicatorState),
    MovingAverage { short: Vec<f64>, long: Vec<f64> },
    Rsi {
        rsi: Vec<f64>,
        overbought: f64,
        oversold: f64,
    },
    Macd(MacdLines),
}

/// A strategy with its indicators computed for one bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStrategy {
    strategy: Strategy,
    series: PreparedSeries,
}

impl PreparedStrategy {
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.strategy.params
    }

    pub fn series(&self) -> &PreparedSeries {
        &self.series
    }

    /// SuperTrend indicator state, if this is the SuperTrend variant.
    pub fn indicator_state(&self) -> Option<&IndicatorState> {
        match &self.series {
            PreparedSeries::SuperTrend(state) => Some(state),
            _ => None,
        }
    }

    /// Signal at bar `i`. `bars` must be the series passed to `prepare()`.
    pub fn signal_at(&self, bars: &[PriceBar], i: usize) -> Signal {
        if i >= bars.len() {
            return Signal::Hold;
        }
        match &self.series {
            PreparedSeries::SuperTrend(state) => {
                supertrend_signal(&bars[..=i], &state.trend, &self.strategy.params)
            }
            PreparedSeries::MovingAverage { short, long } => rules::crossover(short, long, i),
            PreparedSeries::Rsi {
                rsi,
                overbought,
                oversold,
            } => rules::rsi_levels(rsi, i, *overbought, *oversold),
            PreparedSeries::Macd(lines) => rules::crossover(&lines.macd, &lines.signal, i),
        }
    }
}
