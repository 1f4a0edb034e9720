//! Backtest result record.

use serde::{Deserialize, Serialize};
use tradelab_core::{StrategyParameters, Trade};

use crate::metrics::PerformanceReport;

/// Equity after processing one bar: initial capital plus realized profits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub equity: f64,
}

/// Complete, immutable result of one backtest run.
///
/// Owned by the caller; serializes as a flat camelCase record with the
/// performance statistics inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub strategy: String,
    pub parameters: StrategyParameters,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    #[serde(flatten)]
    pub performance: PerformanceReport,
    pub risk_free_rate_per_bar: f64,
    pub bars_processed: usize,
}

impl BacktestResult {
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    /// Running maximum of equity, aligned with `equity_curve`.
    pub fn peak_equity(&self) -> Vec<f64> {
        let mut peak = f64::NEG_INFINITY;
        self.equity_curve
            .iter()
            .map(|p| {
                peak = peak.max(p.equity);
                peak
            })
            .collect()
    }

    /// Recompute statistics from the stored trades and equity curve.
    pub fn recompute_performance(&self) -> PerformanceReport {
        PerformanceReport::compute(
            &self.trades,
            &self.equity_values(),
            self.performance.initial_capital,
            self.risk_free_rate_per_bar,
        )
    }
}
