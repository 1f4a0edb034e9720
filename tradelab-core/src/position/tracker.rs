//! Position tracker state machine.
//!
//! States: flat, long, short. At most one position is open at any time.
//!
//! | state | signal | next  | trade recorded                        |
//! |-------|--------|-------|---------------------------------------|
//! | flat  | buy    | long  | opening buy, `profit = None`          |
//! | flat  | sell   | short | opening sell, `profit = None`         |
//! | long  | sell   | flat  | closing sell, `(price - entry) * size`|
//! | short | buy    | flat  | closing buy, `(entry - price) * size` |
//! | other | any    | same  | none                                  |
//!
//! Closing never reverses: the opposite position can only be opened by a later
//! signal. The stop/take-profit check runs independently of the signal and, in
//! the runner, before the signal of the same bar is evaluated.

use tracing::debug;

use crate::domain::{ExitReason, Position, PositionSide, StrategyParameters, Trade, TradeSide};
use crate::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct PositionTracker {
    position: Position,
    position_size: f64,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    next_trade_id: u64,
}

impl PositionTracker {
    pub fn new(params: &StrategyParameters) -> Self {
        Self {
            position: Position::flat(),
            position_size: params.position_size,
            stop_loss_pct: params.stop_loss_pct,
            take_profit_pct: params.take_profit_pct,
            next_trade_id: 1,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_open(&self) -> bool {
        !self.position.is_flat()
    }

    /// Force-close the open position if the move from entry reaches either
    /// threshold: `|price - entry| / entry >= stop_loss_pct` or
    /// `>= take_profit_pct`. A threshold of 0 is disabled.
    ///
    /// The exit is tagged `StopLoss` when the move went against the position
    /// and `TakeProfit` otherwise.
    pub fn check_exit(&mut self, timestamp: i64, price: f64) -> Option<Trade> {
        let entry = self.position.entry_price?;
        if entry == 0.0 {
            return None;
        }
        let moved = (price - entry).abs() / entry;
        let hit = |pct: f64| pct > 0.0 && moved >= pct;
        if !(hit(self.stop_loss_pct) || hit(self.take_profit_pct)) {
            return None;
        }

        let reason = if self.position.profit_at(price, 1.0) < 0.0 {
            ExitReason::StopLoss
        } else {
            ExitReason::TakeProfit
        };
        debug!(?reason, entry, price, "forced exit");
        Some(self.close(timestamp, price, reason))
    }

    /// Feed one signal at `price`; returns the trade it produced, if any.
    pub fn on_signal(&mut self, signal: Signal, timestamp: i64, price: f64) -> Option<Trade> {
        match (self.position.side, signal) {
            (PositionSide::None, Signal::Buy) => {
                Some(self.open(PositionSide::Long, timestamp, price))
            }
            (PositionSide::None, Signal::Sell) => {
                Some(self.open(PositionSide::Short, timestamp, price))
            }
            (PositionSide::Long, Signal::Sell) | (PositionSide::Short, Signal::Buy) => {
                Some(self.close(timestamp, price, ExitReason::Signal))
            }
            _ => None,
        }
    }

    fn open(&mut self, side: PositionSide, timestamp: i64, price: f64) -> Trade {
        self.position = Position {
            side,
            entry_price: Some(price),
        };
        let trade_side = match side {
            PositionSide::Short => TradeSide::Sell,
            _ => TradeSide::Buy,
        };
        self.record(timestamp, trade_side, price, None, None)
    }

    fn close(&mut self, timestamp: i64, price: f64, reason: ExitReason) -> Trade {
        let profit = self.position.profit_at(price, self.position_size);
        let trade_side = match self.position.side {
            PositionSide::Short => TradeSide::Buy,
            _ => TradeSide::Sell,
        };
        self.position = Position::flat();
        self.record(timestamp, trade_side, price, Some(profit), Some(reason))
    }

    fn record(
        &mut self,
        timestamp: i64,
        side: TradeSide,
        price: f64,
        profit: Option<f64>,
        exit_reason: Option<ExitReason>,
    ) -> Trade {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        Trade {
            id,
            timestamp,
            side,
            price,
            size: self.position_size,
            profit,
            exit_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(size: f64, stop: f64, take: f64) -> PositionTracker {
        PositionTracker::new(&StrategyParameters {
            position_size: size,
            stop_loss_pct: stop,
            take_profit_pct: take,
            ..StrategyParameters::default()
        })
    }

    #[test]
    fn flat_buy_opens_long() {
        let mut t = tracker(1.0, 0.0, 0.0);
        let trade = t.on_signal(Signal::Buy, 1, 100.0).unwrap();
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.profit, None);
        assert_eq!(trade.id, 1);
        assert!(t.position().is_long());
        assert_eq!(t.position().entry_price, Some(100.0));
    }

    #[test]
    fn flat_sell_opens_short() {
        let mut t = tracker(1.0, 0.0, 0.0);
        let trade = t.on_signal(Signal::Sell, 1, 100.0).unwrap();
        assert_eq!(trade.side, TradeSide::Sell);
        assert!(t.position().is_short());
    }

    #[test]
    fn long_sell_closes_with_profit() {
        let mut t = tracker(2.0, 0.0, 0.0);
        t.on_signal(Signal::Buy, 1, 100.0);
        let trade = t.on_signal(Signal::Sell, 2, 110.0).unwrap();
        assert_eq!(trade.profit, Some(20.0));
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.exit_reason, Some(ExitReason::Signal));
        assert_eq!(trade.id, 2);
        assert!(t.position().is_flat());
        assert_eq!(t.position().entry_price, None);
    }

    #[test]
    fn short_buy_closes_with_profit() {
        let mut t = tracker(3.0, 0.0, 0.0);
        t.on_signal(Signal::Sell, 1, 100.0);
        let trade = t.on_signal(Signal::Buy, 2, 90.0).unwrap();
        assert_eq!(trade.profit, Some(30.0));
        assert_eq!(trade.side, TradeSide::Buy);
        assert!(t.position().is_flat());
    }

    #[test]
    fn same_direction_and_hold_are_no_ops() {
        let mut t = tracker(1.0, 0.0, 0.0);
        assert!(t.on_signal(Signal::Hold, 1, 100.0).is_none());
        t.on_signal(Signal::Buy, 2, 100.0);
        assert!(t.on_signal(Signal::Buy, 3, 105.0).is_none());
        assert!(t.on_signal(Signal::Hold, 4, 105.0).is_none());
        assert_eq!(t.position().entry_price, Some(100.0));
    }

    #[test]
    fn close_does_not_reverse() {
        let mut t = tracker(1.0, 0.0, 0.0);
        t.on_signal(Signal::Buy, 1, 100.0);
        t.on_signal(Signal::Sell, 2, 101.0);
        assert!(t.position().is_flat());
        let reopen = t.on_signal(Signal::Sell, 3, 102.0).unwrap();
        assert_eq!(reopen.profit, None);
        assert!(t.position().is_short());
    }

    #[test]
    fn stop_loss_forces_close_on_adverse_move() {
        let mut t = tracker(1.0, 0.02, 0.0);
        t.on_signal(Signal::Buy, 1, 100.0);
        assert!(t.check_exit(2, 99.0).is_none());
        let trade = t.check_exit(3, 97.0).unwrap();
        assert_eq!(trade.profit, Some((97.0 - 100.0) * 1.0));
        assert_eq!(trade.exit_reason, Some(ExitReason::StopLoss));
        assert!(t.position().is_flat());
    }

    #[test]
    fn take_profit_forces_close_on_favorable_move() {
        let mut t = tracker(2.0, 0.0, 0.05);
        t.on_signal(Signal::Sell, 1, 100.0);
        let trade = t.check_exit(2, 94.0).unwrap();
        assert_eq!(trade.profit, Some(12.0));
        assert_eq!(trade.exit_reason, Some(ExitReason::TakeProfit));
        assert_eq!(trade.side, TradeSide::Buy);
    }

    #[test]
    fn zero_thresholds_disable_forced_exits() {
        let mut t = tracker(1.0, 0.0, 0.0);
        t.on_signal(Signal::Buy, 1, 100.0);
        assert!(t.check_exit(2, 1.0).is_none());
        assert!(t.check_exit(3, 1000.0).is_none());
    }

    #[test]
    fn flat_tracker_never_forces_exit() {
        let mut t = tracker(1.0, 0.01, 0.01);
        assert!(t.check_exit(1, 50.0).is_none());
    }

    #[test]
    fn trade_ids_are_sequential() {
        let mut t = tracker(1.0, 0.0, 0.0);
        let ids: Vec<u64> = [Signal::Buy, Signal::Sell, Signal::Sell, Signal::Buy]
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| t.on_signal(s, i as i64, 100.0))
            .map(|trade| trade.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
