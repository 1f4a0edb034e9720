//! TradeLab Core: domain types, indicators, signals, strategies, position tracking.
//!
//! This crate is pure and I/O-free:
//! - Domain types (price bars, trades, positions, strategy parameters and presets)
//! - Indicator library (ATR, SuperTrend with the band ratchet, SMA, EMA, RSI, MACD)
//! - Signal generation (SuperTrend flip rule gated by trend strength)
//! - Enum-dispatched strategy variants resolved through an explicit registry
//! - Position tracker state machine with stop-loss / take-profit exits

pub mod domain;
pub mod error;
pub mod indicators;
pub mod position;
pub mod signal;
pub mod strategy;

pub use domain::{
    ExitReason, Position, PositionSide, PriceBar, StrategyParameters, StrategyPreset, Trade,
    TradeSide,
};
pub use error::EngineError;
pub use indicators::{IndicatorState, SuperTrendBands, Trend};
pub use position::PositionTracker;
pub use signal::Signal;
pub use strategy::{PreparedStrategy, Strategy, StrategyRegistry, StrategyVariant};
