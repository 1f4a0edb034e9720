//! Parameter optimizer: brute-force grid search over strategy parameters.
//!
//! Combinations are enumerated as a Cartesian product in grid insertion
//! order (outer-to-inner, last parameter varies fastest). Each combination is
//! written over the base preset and run through a full backtest. Runs share
//! nothing but the read-only bar slice, so they may execute on the rayon pool.
//!
//! Results are always collected in enumeration order. Best selection is a
//! fold over `(score, index)` preferring the higher score and, on ties, the
//! lower index, which makes it independent of execution order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use tradelab_core::{
    EngineError, PriceBar, Strategy, StrategyParameters, StrategyPreset, StrategyRegistry,
};

use crate::config::BacktestSettings;
use crate::objective::{Constraints, Objective};
use crate::result::BacktestResult;
use crate::runner::{run_backtest, CancelToken, RunError};

/// Slack on the upper bound so `0.1`-style steps still reach `max`.
const RANGE_EPSILON: f64 = 1e-9;

// ─── Grid ────────────────────────────────────────────────────────────

/// Inclusive `{min, max, step}` sweep for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParameterRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// A range with exactly one value.
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value, 1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.min.is_finite() && self.max.is_finite() && self.step.is_finite()) {
            return Err("min, max and step must be finite".into());
        }
        if self.step <= 0.0 {
            return Err(format!("step must be > 0, got {}", self.step));
        }
        if self.min > self.max {
            return Err(format!("min {} exceeds max {}", self.min, self.max));
        }
        Ok(())
    }

    /// `min, min + step, ...` up to `max`. Each value is `min + k * step`.
    /// An invalid range yields no values.
    pub fn values(&self) -> Vec<f64> {
        if self.validate().is_err() {
            return Vec::new();
        }
        let mut values = Vec::new();
        let mut k = 0u32;
        loop {
            let v = self.min + f64::from(k) * self.step;
            if v > self.max + RANGE_EPSILON {
                break;
            }
            values.push(v);
            k += 1;
        }
        values
    }
}

/// Parameter name → range, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterGrid {
    ranges: Vec<(String, ParameterRange)>,
}

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range. Re-inserting a name replaces its range in place.
    pub fn insert(&mut self, name: impl Into<String>, range: ParameterRange) {
        let name = name.into();
        match self.ranges.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = range,
            None => self.ranges.push((name, range)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, range: ParameterRange) -> Self {
        self.insert(name, range);
        self
    }

    /// Parameter names with no effect on `strategy`.
    pub fn unread_by(&self, strategy: &Strategy) -> Vec<&str> {
        self.iter()
            .map(|(name, _)| name)
            .filter(|name| !strategy.reads_parameter(name))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterRange)> {
        self.ranges.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn combination_count(&self) -> usize {
        self.ranges.iter().map(|(_, r)| r.values().len()).product()
    }

    /// Every combination in nested-loop order. An empty grid has exactly one
    /// (empty) combination: the base preset itself.
    pub fn combinations(&self) -> Vec<BTreeMap<String, f64>> {
        let axes: Vec<(&str, Vec<f64>)> = self
            .ranges
            .iter()
            .map(|(n, r)| (n.as_str(), r.values()))
            .collect();
        if axes.iter().any(|(_, v)| v.is_empty()) {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(self.combination_count());
        let mut cursor = vec![0usize; axes.len()];
        loop {
            out.push(
                axes.iter()
                    .zip(&cursor)
                    .map(|((name, values), &k)| (name.to_string(), values[k]))
                    .collect(),
            );

            // odometer: last axis turns fastest
            let mut axis = axes.len();
            loop {
                if axis == 0 {
                    return out;
                }
                axis -= 1;
                cursor[axis] += 1;
                if cursor[axis] < axes[axis].1.len() {
                    break;
                }
                cursor[axis] = 0;
            }
        }
    }
}

impl Serialize for ParameterGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.ranges.len()))?;
        for (name, range) in &self.ranges {
            map.serialize_entry(name, range)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = ParameterGrid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of parameter name to {min, max, step}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut grid = ParameterGrid::new();
                while let Some((name, range)) = access.next_entry::<String, ParameterRange>()? {
                    grid.insert(name, range);
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}

// ─── Results ─────────────────────────────────────────────────────────

/// What happened to one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    Completed(Box<BacktestResult>),
    Failed { error: String },
}

/// One evaluated grid point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Position in enumeration order.
    pub index: usize,
    /// The grid values written over the base preset.
    pub overrides: BTreeMap<String, f64>,
    /// Decoded parameters; absent when the combination could not be decoded.
    pub parameters: Option<StrategyParameters>,
    pub outcome: RunOutcome,
}

impl OptimizationResult {
    pub fn result(&self) -> Option<&BacktestResult> {
        match &self.outcome {
            RunOutcome::Completed(r) => Some(r),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Failed { .. })
    }

    pub fn score(&self, objective: Objective) -> Option<f64> {
        self.result().map(|r| objective.extract(&r.performance))
    }
}

/// Outcome of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub objective: Objective,
    /// Acceptance filters applied by `passing()`.
    pub constraints: Constraints,
    /// Sorted by objective descending (stable), failed combinations last.
    pub results: Vec<OptimizationResult>,
    /// Enumeration index of the best completed combination.
    pub best_index: Option<usize>,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Combinations never run because of cancellation.
    pub skipped: usize,
    pub cancelled: bool,
}

impl OptimizationReport {
    pub fn best(&self) -> Option<&OptimizationResult> {
        let index = self.best_index?;
        self.results.iter().find(|r| r.index == index)
    }

    /// Completed results meeting the report's constraints, in ranking order.
    pub fn passing(&self) -> impl Iterator<Item = &OptimizationResult> + '_ {
        self.results.iter().filter(|r| {
            r.result()
                .is_some_and(|res| self.constraints.is_satisfied_by(&res.performance))
        })
    }

    /// The `n` highest-ranked completed results.
    pub fn top_n(&self, n: usize) -> Vec<&OptimizationResult> {
        self.results
            .iter()
            .filter(|r| !r.is_failed())
            .take(n)
            .collect()
    }
}

// ─── Optimizer ───────────────────────────────────────────────────────

/// Grid-search driver. The registry is injected so parallel workers share it
/// read-only.
#[derive(Debug, Clone)]
pub struct Optimizer<'r> {
    registry: &'r StrategyRegistry,
    settings: BacktestSettings,
    objective: Objective,
    constraints: Constraints,
    parallel: bool,
}

impl<'r> Optimizer<'r> {
    pub fn new(registry: &'r StrategyRegistry) -> Self {
        Self {
            registry,
            settings: BacktestSettings::default(),
            objective: Objective::default(),
            constraints: Constraints::default(),
            parallel: false,
        }
    }

    pub fn with_settings(mut self, settings: BacktestSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn optimize(
        &self,
        bars: &[PriceBar],
        base: &StrategyPreset,
        grid: &ParameterGrid,
        cancel: &CancelToken,
    ) -> Result<OptimizationReport, RunError> {
        self.optimize_with_progress(bars, base, grid, cancel, |_, _| {})
    }

    /// Run the grid, calling `progress(done, total)` after each combination.
    ///
    /// Fails up front for an unknown strategy name or invalid settings. Any
    /// per-combination failure is recorded and the search continues.
    pub fn optimize_with_progress<P>(
        &self,
        bars: &[PriceBar],
        base: &StrategyPreset,
        grid: &ParameterGrid,
        cancel: &CancelToken,
        progress: P,
    ) -> Result<OptimizationReport, RunError>
    where
        P: Fn(usize, usize) + Sync,
    {
        if !self.registry.contains(&base.name) {
            return Err(EngineError::UnknownStrategyKind(base.name.clone()).into());
        }
        self.settings
            .validate()
            .map_err(|e| RunError::InvalidSettings(e.to_string()))?;

        if let Ok(strategy) = self.registry.build_preset(base) {
            for name in grid.unread_by(&strategy) {
                warn!(
                    parameter = name,
                    strategy = strategy.name(),
                    "grid parameter has no effect on the strategy"
                );
            }
        }

        let combinations = grid.combinations();
        let total = combinations.len();
        let done = AtomicUsize::new(0);
        info!(
            strategy = %base.name,
            combinations = total,
            objective = %self.objective,
            parallel = self.parallel,
            "optimization started"
        );

        let evaluate = |(index, overrides): (usize, &BTreeMap<String, f64>)| {
            let outcome = self.evaluate(index, overrides, bars, base, cancel);
            if outcome.is_some() {
                progress(done.fetch_add(1, Ordering::Relaxed) + 1, total);
            }
            outcome
        };
        let evaluated: Vec<Option<OptimizationResult>> = if self.parallel {
            combinations.par_iter().enumerate().map(evaluate).collect()
        } else {
            combinations.iter().enumerate().map(evaluate).collect()
        };
        let mut results: Vec<OptimizationResult> = evaluated.into_iter().flatten().collect();

        let objective = self.objective;
        let scored = |r: &OptimizationResult| r.score(objective).map(|s| (s, r.index));
        let best_index = if self.parallel {
            results.par_iter().filter_map(scored).reduce_with(better)
        } else {
            results.iter().filter_map(scored).reduce(better)
        }
        .map(|(_, index)| index);

        results.sort_by(|a, b| match (a.score(objective), b.score(objective)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        let failed = results.iter().filter(|r| r.is_failed()).count();
        let report = OptimizationReport {
            objective,
            constraints: self.constraints,
            total,
            completed: results.len() - failed,
            failed,
            skipped: total - results.len(),
            cancelled: cancel.is_cancelled(),
            best_index,
            results,
        };
        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            best = ?report.best_index,
            "optimization finished"
        );
        Ok(report)
    }

    /// Run one combination. `None` means it was skipped by cancellation.
    fn evaluate(
        &self,
        index: usize,
        overrides: &BTreeMap<String, f64>,
        bars: &[PriceBar],
        base: &StrategyPreset,
        cancel: &CancelToken,
    ) -> Option<OptimizationResult> {
        if cancel.is_cancelled() {
            return None;
        }
        let preset = base.with_overrides(overrides);
        let outcome = match run_backtest(bars, &preset, self.registry, &self.settings, cancel) {
            Ok(result) => RunOutcome::Completed(Box::new(result)),
            Err(RunError::Cancelled { .. }) => return None,
            Err(e) => {
                warn!(index, error = %e, ?overrides, "combination failed");
                RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        Some(OptimizationResult {
            index,
            overrides: overrides.clone(),
            parameters: preset.parameters().ok(),
            outcome,
        })
    }
}

/// Higher score wins; equal scores go to the earlier combination.
fn better(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    match a.0.total_cmp(&b.0) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a.1 <= b.1 {
                a
            } else {
                b
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_values_are_inclusive() {
        assert_eq!(ParameterRange::new(5.0, 20.0, 5.0).values(), vec![5.0, 10.0, 15.0, 20.0]);
        assert_eq!(ParameterRange::new(1.0, 2.5, 1.0).values(), vec![1.0, 2.0]);
        assert_eq!(ParameterRange::fixed(3.0).values(), vec![3.0]);
    }

    #[test]
    fn fractional_steps_reach_max_without_drift() {
        let values = ParameterRange::new(0.0, 1.0, 0.1).values();
        assert_eq!(values.len(), 11);
        assert_eq!(values[3], 3.0 * 0.1);
    }

    #[test]
    fn invalid_range_has_no_values() {
        assert!(ParameterRange::new(2.0, 1.0, 1.0).values().is_empty());
        assert!(ParameterRange::new(1.0, 2.0, 0.0).values().is_empty());
        assert!(ParameterRange::new(1.0, 2.0, -1.0).validate().is_err());
    }

    #[test]
    fn combinations_follow_insertion_order() {
        let grid = ParameterGrid::new()
            .with("b", ParameterRange::new(1.0, 2.0, 1.0))
            .with("a", ParameterRange::new(10.0, 30.0, 10.0));
        let combos = grid.combinations();
        assert_eq!(combos.len(), 6);
        assert_eq!(grid.combination_count(), 6);
        let pairs: Vec<(f64, f64)> = combos.iter().map(|c| (c["b"], c["a"])).collect();
        assert_eq!(
            pairs,
            vec![(1.0, 10.0), (1.0, 20.0), (1.0, 30.0), (2.0, 10.0), (2.0, 20.0), (2.0, 30.0)]
        );
    }

    #[test]
    fn empty_grid_is_one_empty_combination() {
        let combos = ParameterGrid::new().combinations();
        assert_eq!(combos, vec![BTreeMap::new()]);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let grid = ParameterGrid::new()
            .with("a", ParameterRange::fixed(1.0))
            .with("b", ParameterRange::fixed(2.0))
            .with("a", ParameterRange::fixed(5.0));
        let names: Vec<&str> = grid.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(grid.combinations()[0]["a"], 5.0);
    }

    #[test]
    fn grid_json_keeps_order() {
        let json = r#"{"z":{"min":1,"max":1,"step":1},"a":{"min":2,"max":2,"step":1}}"#;
        let grid: ParameterGrid = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = grid.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["z", "a"]);
        let back: ParameterGrid =
            serde_json::from_str(&serde_json::to_string(&grid).unwrap()).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn unread_names_depend_on_the_strategy() {
        let registry = StrategyRegistry::with_builtins();
        let grid = ParameterGrid::new()
            .with("rsiPeriod", ParameterRange::fixed(2.0))
            .with("multiplier", ParameterRange::fixed(2.0))
            .with("atrPeriood", ParameterRange::fixed(7.0));
        let rsi = registry.build("RSI", &BTreeMap::new()).unwrap();
        assert_eq!(grid.unread_by(&rsi), vec!["atrPeriood"]);
        let st = registry.build("SuperTrend", &BTreeMap::new()).unwrap();
        assert_eq!(grid.unread_by(&st), vec!["rsiPeriod", "atrPeriood"]);
    }

    #[test]
    fn better_is_order_independent() {
        let items = [(1.0, 3), (2.0, 5), (2.0, 1), (0.5, 0)];
        let forward = items.iter().copied().reduce(better);
        let backward = items.iter().rev().copied().reduce(better);
        assert_eq!(forward, Some((2.0, 1)));
        assert_eq!(backward, Some((2.0, 1)));
    }
}
