//! Performance analytics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity values and/or trade list in, scalar
//! out. Degenerate inputs (no trades, zero variance, zero peak equity) yield 0.0,
//! and no function here ever returns NaN or an infinity.

use serde::{Deserialize, Serialize};
use tradelab_core::Trade;

/// Standard deviations below this are treated as zero.
const STD_EPSILON: f64 = 1e-15;

/// Aggregate statistics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Final equity minus initial capital.
    pub total_return: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    /// Winning closed trades as a percentage of all closed trades.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub average_profit: f64,
    pub average_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceReport {
    /// Compute all statistics from a trade list and per-bar equity values.
    ///
    /// An empty equity curve is treated as flat at `initial_capital`.
    pub fn compute(
        trades: &[Trade],
        equity: &[f64],
        initial_capital: f64,
        risk_free_rate_per_bar: f64,
    ) -> Self {
        let final_equity = equity.last().copied().unwrap_or(initial_capital);
        let total_return = final_equity - initial_capital;
        let total_return_pct = if initial_capital != 0.0 {
            total_return / initial_capital * 100.0
        } else {
            0.0
        };
        let profits = closed_profits(trades);

        Self {
            total_return: finite_or_zero(total_return),
            total_return_pct: finite_or_zero(total_return_pct),
            max_drawdown_pct: max_drawdown_pct(equity),
            win_rate: win_rate(&profits),
            profit_factor: profit_factor(&profits),
            sharpe_ratio: sharpe_ratio(equity, risk_free_rate_per_bar),
            sortino_ratio: sortino_ratio(equity, risk_free_rate_per_bar),
            initial_capital: finite_or_zero(initial_capital),
            final_equity: finite_or_zero(final_equity),
            total_trades: profits.len(),
            winning_trades: profits.iter().filter(|p| **p > 0.0).count(),
            losing_trades: profits.iter().filter(|p| **p < 0.0).count(),
            average_profit: average_profit(&profits),
            average_loss: average_loss(&profits),
            max_consecutive_wins: max_consecutive(&profits, |p| p > 0.0),
            max_consecutive_losses: max_consecutive(&profits, |p| p < 0.0),
        }
    }

    /// True if every float field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.total_return,
            self.total_return_pct,
            self.max_drawdown_pct,
            self.win_rate,
            self.profit_factor,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.initial_capital,
            self.final_equity,
            self.average_profit,
            self.average_loss,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Profits of closing trades, in trade order.
pub fn closed_profits(trades: &[Trade]) -> Vec<f64> {
    trades.iter().filter_map(|t| t.profit).collect()
}

/// Maximum peak-to-trough decline in percent.
///
/// The peak is the running maximum of equity; points where it is not positive
/// contribute 0.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &eq in equity {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    finite_or_zero(max_dd)
}

/// Winning closed trades over all closed trades, in percent.
pub fn win_rate(profits: &[f64]) -> f64 {
    if profits.is_empty() {
        return 0.0;
    }
    let winners = profits.iter().filter(|p| **p > 0.0).count();
    winners as f64 / profits.len() as f64 * 100.0
}

/// Gross profit over gross loss.
///
/// 0.0 when there are no losing trades or no winning trades.
pub fn profit_factor(profits: &[f64]) -> f64 {
    let gross_profit: f64 = profits.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();

    if gross_loss == 0.0 || gross_profit == 0.0 {
        return 0.0;
    }
    finite_or_zero(gross_profit / gross_loss)
}

/// Per-bar Sharpe ratio: (mean(r) - rf) / std(r), population std.
pub fn sharpe_ratio(equity: &[f64], risk_free_rate_per_bar: f64) -> f64 {
    let returns = bar_returns(equity);
    if returns.is_empty() {
        return 0.0;
    }
    let std = std_dev(&returns);
    if !(std >= STD_EPSILON) {
        return 0.0;
    }
    finite_or_zero((mean_f64(&returns) - risk_free_rate_per_bar) / std)
}

/// Per-bar Sortino ratio: the Sharpe numerator over the population std of the
/// negative returns.
pub fn sortino_ratio(equity: &[f64], risk_free_rate_per_bar: f64) -> f64 {
    let returns = bar_returns(equity);
    if returns.is_empty() {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let downside_std = std_dev(&downside);
    if !(downside_std >= STD_EPSILON) {
        return 0.0;
    }
    finite_or_zero((mean_f64(&returns) - risk_free_rate_per_bar) / downside_std)
}

/// Mean of positive profits.
pub fn average_profit(profits: &[f64]) -> f64 {
    let wins: Vec<f64> = profits.iter().copied().filter(|p| *p > 0.0).collect();
    finite_or_zero(mean_f64(&wins))
}

/// Mean magnitude of negative profits.
pub fn average_loss(profits: &[f64]) -> f64 {
    let losses: Vec<f64> = profits
        .iter()
        .copied()
        .filter(|p| *p < 0.0)
        .map(f64::abs)
        .collect();
    finite_or_zero(mean_f64(&losses))
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Per-bar simple returns; a zero previous equity yields a 0.0 return.
pub fn bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| {
            if w[0] != 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn max_consecutive(profits: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for &p in profits {
        if pred(p) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}
