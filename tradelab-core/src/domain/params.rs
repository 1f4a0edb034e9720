//! Strategy parameters and stored presets.
//!
//! Parameters travel as a flat `name -> f64` map (the shape of a stored preset
//! and of one optimizer grid point) and are decoded into `StrategyParameters`
//! with defaults for absent fields. Keys this struct does not know about stay
//! in the map for variant-specific decoding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const ATR_PERIOD: &str = "atrPeriod";
pub const MULTIPLIER: &str = "multiplier";
pub const TREND_STRENGTH_FILTER: &str = "trendStrengthFilter";
pub const POSITION_SIZE: &str = "positionSize";
pub const STOP_LOSS_PCT: &str = "stopLossPct";
pub const TAKE_PROFIT_PCT: &str = "takeProfitPct";

/// Shared numeric parameters of every strategy variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyParameters {
    pub atr_period: usize,
    pub multiplier: f64,
    /// Minimum trend strength in [0, 1]; 0 disables the filter.
    pub trend_strength_filter: f64,
    pub position_size: f64,
    /// Fractional move from entry (0.02 = 2%); 0 disables.
    pub stop_loss_pct: f64,
    /// Fractional move from entry; 0 disables.
    pub take_profit_pct: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            atr_period: 14,
            multiplier: 3.0,
            trend_strength_filter: 0.0,
            position_size: 1.0,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        }
    }
}

impl StrategyParameters {
    /// Map keys decoded by `from_map`.
    pub const KEYS: [&'static str; 6] = [
        ATR_PERIOD,
        MULTIPLIER,
        TREND_STRENGTH_FILTER,
        POSITION_SIZE,
        STOP_LOSS_PCT,
        TAKE_PROFIT_PCT,
    ];

    /// Decode from a flat parameter map, applying defaults and validating.
    pub fn from_map(params: &BTreeMap<String, f64>) -> Result<Self, EngineError> {
        let defaults = Self::default();
        let get = |name: &str, default: f64| params.get(name).copied().unwrap_or(default);

        let parsed = Self {
            atr_period: whole_number(ATR_PERIOD, get(ATR_PERIOD, defaults.atr_period as f64))?,
            multiplier: get(MULTIPLIER, defaults.multiplier),
            trend_strength_filter: get(TREND_STRENGTH_FILTER, defaults.trend_strength_filter),
            position_size: get(POSITION_SIZE, defaults.position_size),
            stop_loss_pct: get(STOP_LOSS_PCT, defaults.stop_loss_pct),
            take_profit_pct: get(TAKE_PROFIT_PCT, defaults.take_profit_pct),
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Encode back into the flat map form.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            (ATR_PERIOD.to_string(), self.atr_period as f64),
            (MULTIPLIER.to_string(), self.multiplier),
            (TREND_STRENGTH_FILTER.to_string(), self.trend_strength_filter),
            (POSITION_SIZE.to_string(), self.position_size),
            (STOP_LOSS_PCT.to_string(), self.stop_loss_pct),
            (TAKE_PROFIT_PCT.to_string(), self.take_profit_pct),
        ])
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.atr_period < 1 {
            return Err(EngineError::invalid(ATR_PERIOD, "must be >= 1"));
        }
        if self.atr_period > MAX_PERIOD {
            return Err(EngineError::invalid(
                ATR_PERIOD,
                format!("must be <= {MAX_PERIOD}"),
            ));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(EngineError::invalid(MULTIPLIER, "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.trend_strength_filter) {
            return Err(EngineError::invalid(
                TREND_STRENGTH_FILTER,
                "must be within [0, 1]",
            ));
        }
        if !(self.position_size.is_finite() && self.position_size > 0.0) {
            return Err(EngineError::invalid(POSITION_SIZE, "must be > 0"));
        }
        for (name, value) in [
            (STOP_LOSS_PCT, self.stop_loss_pct),
            (TAKE_PROFIT_PCT, self.take_profit_pct),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::invalid(name, "must be >= 0"));
            }
        }
        Ok(())
    }
}

/// Largest accepted lookback period.
pub const MAX_PERIOD: usize = u32::MAX as usize;

/// Decode a map value that must be a whole number in `1..=MAX_PERIOD`.
pub(crate) fn whole_number(name: &str, value: f64) -> Result<usize, EngineError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(EngineError::invalid(name, "must be a whole number"));
    }
    if value < 1.0 {
        return Err(EngineError::invalid(name, "must be >= 1"));
    }
    if value > MAX_PERIOD as f64 {
        return Err(EngineError::invalid(
            name,
            format!("must be <= {MAX_PERIOD}"),
        ));
    }
    Ok(value as usize)
}

/// A stored strategy preset: variant name plus its flat parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPreset {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl StrategyPreset {
    pub fn new(name: impl Into<String>, params: BTreeMap<String, f64>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Copy of this preset with `overrides` written over its params.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Self {
        let mut params = self.params.clone();
        params.extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        Self {
            name: self.name.clone(),
            params,
        }
    }

    pub fn parameters(&self) -> Result<StrategyParameters, EngineError> {
        StrategyParameters::from_map(&self.params)
    }
}
