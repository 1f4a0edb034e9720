//! TradeLab Runner: backtest sessions, analytics and grid optimization.
//!
//! This crate builds on `tradelab-core` to provide:
//! - Batch-at-a-time backtest sessions with cooperative yield and cancellation
//! - Performance analytics over trades and equity curves
//! - Brute-force parameter optimization (sequential or rayon-parallel)
//! - TOML run configuration
//! - Content-addressed run ids and a caller-owned result arena
//! - CSV and synthetic bar loading

pub mod arena;
pub mod config;
pub mod data_loader;
pub mod metrics;
pub mod objective;
pub mod optimizer;
pub mod result;
pub mod runner;

pub use arena::{RunArena, RunId};
pub use config::{BacktestSettings, ConfigError, OptimizeSection, RunConfig};
pub use data_loader::{load_bars_csv, read_bars, synthetic_bars, DataError};
pub use metrics::PerformanceReport;
pub use objective::{Constraints, Objective, UnknownObjective};
pub use optimizer::{
    OptimizationReport, OptimizationResult, Optimizer, ParameterGrid, ParameterRange, RunOutcome,
};
pub use result::{BacktestResult, EquityPoint};
pub use runner::{
    run_backtest, BacktestSession, CancelToken, Progress, RunError, SessionState,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn session_is_send() {
        assert_send::<BacktestSession<'static>>();
    }

    #[test]
    fn cancel_token_is_send_sync() {
        assert_send::<CancelToken>();
        assert_sync::<CancelToken>();
    }

    #[test]
    fn optimizer_is_send_sync() {
        assert_send::<Optimizer<'static>>();
        assert_sync::<Optimizer<'static>>();
        assert_send::<OptimizationReport>();
        assert_sync::<OptimizationReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }

    #[test]
    fn arena_is_send_sync() {
        assert_send::<RunArena>();
        assert_sync::<RunArena>();
    }
}
