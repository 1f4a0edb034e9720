//! Trade: one fill recorded by the position tracker.

use serde::{Deserialize, Serialize};

/// Direction of a recorded trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExitReason {
    /// Opposite signal from the strategy.
    Signal,
    StopLoss,
    TakeProfit,
}

/// A single opening or closing trade.
///
/// `profit` is `None` for an opening trade and `Some` for a closing one.
/// Trades are append-only within a run; `id` is the sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub timestamp: i64,
    pub side: TradeSide,
    pub price: f64,
    pub size: f64,
    pub profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

impl Trade {
    pub fn is_closing(&self) -> bool {
        self.profit.is_some()
    }

    /// Closing trade with strictly positive profit.
    pub fn is_winner(&self) -> bool {
        matches!(self.profit, Some(p) if p > 0.0)
    }

    /// Closing trade with strictly negative profit.
    pub fn is_loser(&self) -> bool {
        matches!(self.profit, Some(p) if p < 0.0)
    }
}
