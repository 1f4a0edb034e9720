//! Domain types for TradeLab

pub mod bar;
pub mod params;
pub mod position;
pub mod trade;

pub use bar::PriceBar;
pub use params::{StrategyParameters, StrategyPreset, MAX_PERIOD};
pub use position::{Position, PositionSide};
pub use trade::{ExitReason, Trade, TradeSide};
