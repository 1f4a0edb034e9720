//! Strategy registry: resolves a preset name to a configured `Strategy`.
//!
//! Built once by the caller and passed by reference into runners and the
//! optimizer. Lookup normalizes names (case, `_`, `-` and spaces are ignored),
//! so `"SuperTrend"`, `"super_trend"` and `"supertrend"` resolve alike.

use std::collections::{BTreeMap, HashMap};

use crate::domain::params::whole_number;
use crate::domain::{StrategyParameters, StrategyPreset};
use crate::error::EngineError;

use super::{Strategy, StrategyVariant};

/// Builds a strategy from a preset's flat parameter map.
pub type StrategyConstructor = fn(&BTreeMap<String, f64>) -> Result<Strategy, EngineError>;

#[derive(Clone)]
pub struct StrategyRegistry {
    constructors: HashMap<String, StrategyConstructor>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the four built-in variants.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("SuperTrend", build_supertrend);
        registry.register("MovingAverage", build_moving_average);
        registry.register("RSI", build_rsi);
        registry.register("MACD", build_macd);
        registry
    }

    /// Add or replace a constructor under `name`.
    pub fn register(&mut self, name: &str, constructor: StrategyConstructor) {
        self.constructors.insert(normalize(name), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&normalize(name))
    }

    /// Registered (normalized) names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve `name` and build it from `params`.
    pub fn build(&self, name: &str, params: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
        let constructor = self
            .constructors
            .get(&normalize(name))
            .ok_or_else(|| EngineError::UnknownStrategyKind(name.to_string()))?;
        constructor(params)
    }

    pub fn build_preset(&self, preset: &StrategyPreset) -> Result<Strategy, EngineError> {
        self.build(&preset.name, &preset.params)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

// ─── Helpers ─────────────────────────────────────────────────────────

/// Extract a named f64 parameter, falling back to `default`.
fn param(params: &BTreeMap<String, f64>, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// Extract a named period (whole number >= 1), falling back to `default`.
fn param_period(
    params: &BTreeMap<String, f64>,
    name: &str,
    default: usize,
) -> Result<usize, EngineError> {
    whole_number(name, param(params, name, default as f64))
}

// ─── Built-in constructors ───────────────────────────────────────────

fn build_supertrend(params: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
    Ok(Strategy::new(
        StrategyVariant::SuperTrend,
        StrategyParameters::from_map(params)?,
    ))
}

fn build_moving_average(params: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
    let short_period = param_period(params, "shortPeriod", 10)?;
    let long_period = param_period(params, "longPeriod", 30)?;
    if short_period >= long_period {
        return Err(EngineError::invalid(
            "shortPeriod",
            format!("must be below longPeriod ({long_period})"),
        ));
    }
    Ok(Strategy::new(
        StrategyVariant::MovingAverage {
            short_period,
            long_period,
        },
        StrategyParameters::from_map(params)?,
    ))
}

fn build_rsi(params: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
    let period = param_period(params, "rsiPeriod", 14)?;
    let overbought = param(params, "overbought", 70.0);
    let oversold = param(params, "oversold", 30.0);
    if !(0.0..=100.0).contains(&overbought) || !(0.0..=100.0).contains(&oversold) {
        return Err(EngineError::invalid("overbought", "levels must be within [0, 100]"));
    }
    if oversold >= overbought {
        return Err(EngineError::invalid(
            "oversold",
            format!("must be below overbought ({overbought})"),
        ));
    }
    Ok(Strategy::new(
        StrategyVariant::Rsi {
            period,
            overbought,
            oversold,
        },
        StrategyParameters::from_map(params)?,
    ))
}

fn build_macd(params: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
    let fast_period = param_period(params, "fastPeriod", 12)?;
    let slow_period = param_period(params, "slowPeriod", 26)?;
    let signal_period = param_period(params, "signalPeriod", 9)?;
    if fast_period >= slow_period {
        return Err(EngineError::invalid(
            "fastPeriod",
            format!("must be below slowPeriod ({slow_period})"),
        ));
    }
    Ok(Strategy::new(
        StrategyVariant::Macd {
            fast_period,
            slow_period,
            signal_period,
        },
        StrategyParameters::from_map(params)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn resolves_builtins_case_insensitively() {
        let registry = StrategyRegistry::with_builtins();
        for name in ["SuperTrend", "supertrend", "super_trend", "SUPER-TREND"] {
            let s = registry.build(name, &BTreeMap::new()).unwrap();
            assert_eq!(s.variant, StrategyVariant::SuperTrend);
        }
        assert_eq!(registry.build("rsi", &BTreeMap::new()).unwrap().name(), "RSI");
        assert_eq!(
            registry.build("moving_average", &BTreeMap::new()).unwrap().name(),
            "MovingAverage"
        );
        assert_eq!(registry.build("Macd", &BTreeMap::new()).unwrap().name(), "MACD");
    }

    #[test]
    fn built_strategies_read_their_own_keys() {
        let registry = StrategyRegistry::with_builtins();
        let rsi = registry.build("RSI", &BTreeMap::new()).unwrap();
        assert!(rsi.reads_parameter("rsiPeriod"));
        assert!(rsi.reads_parameter("stopLossPct"));
        assert!(!rsi.reads_parameter("fastPeriod"));

        let st = registry.build("SuperTrend", &BTreeMap::new()).unwrap();
        assert!(st.reads_parameter("atrPeriod"));
        assert!(!st.reads_parameter("atrperiod"));
        assert!(!st.reads_parameter("shortPeriod"));
    }

    #[test]
    fn unknown_name_fails() {
        let registry = StrategyRegistry::with_builtins();
        let err = registry.build("Ichimoku", &BTreeMap::new()).unwrap_err();
        assert_eq!(err, EngineError::UnknownStrategyKind("Ichimoku".into()));
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = StrategyRegistry::new();
        assert!(!registry.contains("SuperTrend"));
        assert!(registry.build("SuperTrend", &BTreeMap::new()).is_err());
    }

    #[test]
    fn names_are_sorted_and_normalized() {
        let registry = StrategyRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["macd", "movingaverage", "rsi", "supertrend"]
        );
    }

    #[test]
    fn variant_defaults_apply() {
        let registry = StrategyRegistry::with_builtins();
        let s = registry.build("MACD", &BTreeMap::new()).unwrap();
        assert_eq!(
            s.variant,
            StrategyVariant::Macd {
                fast_period: 12,
                slow_period: 26,
                signal_period: 9
            }
        );
    }

    #[test]
    fn shared_params_flow_into_every_variant() {
        let registry = StrategyRegistry::with_builtins();
        let params = map(&[("positionSize", 3.0), ("stopLossPct", 0.05)]);
        let s = registry.build("RSI", &params).unwrap();
        assert_eq!(s.params.position_size, 3.0);
        assert_eq!(s.params.stop_loss_pct, 0.05);
    }

    #[test]
    fn rejects_inverted_periods() {
        let registry = StrategyRegistry::with_builtins();
        let params = map(&[("shortPeriod", 30.0), ("longPeriod", 10.0)]);
        assert!(matches!(
            registry.build("MovingAverage", &params),
            Err(EngineError::InvalidParameter { .. })
        ));
        let params = map(&[("oversold", 80.0)]);
        assert!(registry.build("RSI", &params).is_err());
    }

    #[test]
    fn custom_constructor_can_be_registered() {
        fn always_supertrend(p: &BTreeMap<String, f64>) -> Result<Strategy, EngineError> {
            build_supertrend(p)
        }
        let mut registry = StrategyRegistry::new();
        registry.register("Trend Follower", always_supertrend);
        assert!(registry.contains("trendfollower"));
    }

    #[test]
    fn builds_from_preset() {
        let registry = StrategyRegistry::with_builtins();
        let preset = StrategyPreset::new("SuperTrend", map(&[("atrPeriod", 7.0)]));
        assert_eq!(registry.build_preset(&preset).unwrap().params.atr_period, 7);
    }
}
