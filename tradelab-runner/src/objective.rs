//! Optimization objective and post-hoc result constraints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceReport;

/// Which statistic the optimizer maximizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Objective {
    #[default]
    TotalReturnPct,
    SharpeRatio,
    WinRate,
}

impl Objective {
    /// Extract the objective's value from a report.
    pub fn extract(&self, report: &PerformanceReport) -> f64 {
        match self {
            Self::TotalReturnPct => report.total_return_pct,
            Self::SharpeRatio => report.sharpe_ratio,
            Self::WinRate => report.win_rate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalReturnPct => "totalReturnPct",
            Self::SharpeRatio => "sharpeRatio",
            Self::WinRate => "winRate",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown objective '{0}' (expected totalReturnPct, sharpeRatio or winRate)")]
pub struct UnknownObjective(pub String);

impl FromStr for Objective {
    type Err = UnknownObjective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "totalreturnpct" => Ok(Self::TotalReturnPct),
            "sharperatio" | "sharpe" => Ok(Self::SharpeRatio),
            "winrate" => Ok(Self::WinRate),
            _ => Err(UnknownObjective(s.to_string())),
        }
    }
}

/// Optional filters applied to finished results.
///
/// Constraints never stop a combination from running; they only decide which
/// completed results count as acceptable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constraints {
    /// Upper bound on `maxDrawdownPct`.
    pub max_drawdown_pct: Option<f64>,
    /// Lower bound on `winRate` (percent).
    pub min_win_rate: Option<f64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.max_drawdown_pct.is_none() && self.min_win_rate.is_none()
    }

    pub fn is_satisfied_by(&self, report: &PerformanceReport) -> bool {
        let dd_ok = self
            .max_drawdown_pct
            .map_or(true, |max| report.max_drawdown_pct <= max);
        let wr_ok = self
            .min_win_rate
            .map_or(true, |min| report.win_rate >= min);
        dd_ok && wr_ok
    }
}
