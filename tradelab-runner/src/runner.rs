//! Backtest runner: replays a bar series through a prepared strategy.
//!
//! Indicators are computed once when the session is created. Bars are then
//! replayed strictly in order, in fixed-size batches. Between batches the
//! session returns control to the caller (the yield point), which may run
//! other work or cancel; resuming continues from exactly the next bar.
//!
//! Per bar:
//! 1. forced stop-loss / take-profit exit at the close
//! 2. strategy signal for the bar
//! 3. signal + close fed to the position tracker
//! 4. equity point = initial capital + realized profit so far

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use tradelab_core::{
    EngineError, PositionTracker, PreparedStrategy, PriceBar, Strategy, StrategyPreset,
    StrategyRegistry, Trade,
};

use crate::config::BacktestSettings;
use crate::metrics::PerformanceReport;
use crate::result::{BacktestResult, EquityPoint};

/// Errors from a backtest run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("strategy error: {0}")]
    Engine(#[from] EngineError),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("bar {index} is out of timestamp order")]
    UnorderedBars { index: usize },
    #[error("bar {index} has a non-finite field or a non-positive close")]
    InvalidBar { index: usize },
    #[error("run cancelled after {bars_processed} bars")]
    Cancelled { bars_processed: usize },
    #[error("session is {0:?}, expected {1}")]
    InvalidState(SessionState, &'static str),
}

/// Cooperative cancellation flag shared between a caller and running work.
///
/// Checked only at batch and combination boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Session lifecycle: `Idle → Running → Complete | Failed | Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running { next_bar: usize },
    Complete,
    Failed,
    Cancelled,
}

/// Progress reported after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bars_processed: usize,
    pub total_bars: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.bars_processed >= self.total_bars
    }
}

/// A resumable, batch-at-a-time backtest over a borrowed bar series.
#[derive(Debug)]
pub struct BacktestSession<'a> {
    bars: &'a [PriceBar],
    prepared: PreparedStrategy,
    tracker: PositionTracker,
    settings: BacktestSettings,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    realized: f64,
    state: SessionState,
}

impl<'a> BacktestSession<'a> {
    /// Validate settings and precompute the strategy's indicators.
    pub fn new(
        bars: &'a [PriceBar],
        strategy: &Strategy,
        settings: &BacktestSettings,
    ) -> Result<Self, RunError> {
        settings
            .validate()
            .map_err(|e| RunError::InvalidSettings(e.to_string()))?;
        strategy.params.validate()?;

        Ok(Self {
            bars,
            prepared: strategy.prepare(bars),
            tracker: PositionTracker::new(&strategy.params),
            settings: settings.clone(),
            trades: Vec::new(),
            equity_curve: Vec::with_capacity(bars.len()),
            realized: 0.0,
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> Progress {
        Progress {
            bars_processed: self.equity_curve.len(),
            total_bars: self.bars.len(),
        }
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Process one batch of at most `batch_size` bars.
    pub fn advance(&mut self) -> Result<Progress, RunError> {
        let start = match self.state {
            SessionState::Idle => 0,
            SessionState::Running { next_bar } => next_bar,
            other => return Err(RunError::InvalidState(other, "Idle or Running")),
        };
        let end = (start + self.settings.batch_size).min(self.bars.len());

        for i in start..end {
            if let Err(e) = self.step(i) {
                self.state = SessionState::Failed;
                return Err(e);
            }
        }

        self.state = if end >= self.bars.len() {
            SessionState::Complete
        } else {
            SessionState::Running { next_bar: end }
        };
        debug!(from = start, to = end, total = self.bars.len(), "batch processed");
        Ok(self.progress())
    }

    /// Drive the session to completion, yielding the thread between batches.
    pub fn run(self, cancel: &CancelToken) -> Result<BacktestResult, RunError> {
        self.run_with_yield(cancel, |_| std::thread::yield_now())
    }

    /// Drive the session to completion, calling `on_yield` between batches.
    ///
    /// Cancellation is checked before every batch.
    pub fn run_with_yield<F>(mut self, cancel: &CancelToken, mut on_yield: F) -> Result<BacktestResult, RunError>
    where
        F: FnMut(&Progress),
    {
        loop {
            if cancel.is_cancelled() {
                self.state = SessionState::Cancelled;
                return Err(RunError::Cancelled {
                    bars_processed: self.equity_curve.len(),
                });
            }
            let progress = self.advance()?;
            if self.state == SessionState::Complete {
                break;
            }
            on_yield(&progress);
        }
        self.finish()
    }

    /// Hand the completed run to analytics and build the result.
    pub fn finish(self) -> Result<BacktestResult, RunError> {
        if self.state != SessionState::Complete {
            return Err(RunError::InvalidState(self.state, "Complete"));
        }
        let equity: Vec<f64> = self.equity_curve.iter().map(|p| p.equity).collect();
        let performance = PerformanceReport::compute(
            &self.trades,
            &equity,
            self.settings.initial_capital,
            self.settings.risk_free_rate_per_bar,
        );
        info!(
            strategy = self.prepared.strategy().name(),
            bars = self.bars.len(),
            trades = self.trades.len(),
            total_return_pct = performance.total_return_pct,
            "backtest complete"
        );
        Ok(BacktestResult {
            strategy: self.prepared.strategy().name().to_string(),
            parameters: *self.prepared.params(),
            trades: self.trades,
            equity_curve: self.equity_curve,
            performance,
            risk_free_rate_per_bar: self.settings.risk_free_rate_per_bar,
            bars_processed: self.bars.len(),
        })
    }

    fn step(&mut self, i: usize) -> Result<(), RunError> {
        let bars = self.bars;
        let bar = &bars[i];
        if !bar.is_tradeable() {
            return Err(RunError::InvalidBar { index: i });
        }
        if i > 0 && bar.timestamp < bars[i - 1].timestamp {
            return Err(RunError::UnorderedBars { index: i });
        }

        if let Some(trade) = self.tracker.check_exit(bar.timestamp, bar.close) {
            self.record(trade);
        }
        let signal = self.prepared.signal_at(bars, i);
        if let Some(trade) = self.tracker.on_signal(signal, bar.timestamp, bar.close) {
            self.record(trade);
        }

        self.equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: self.settings.initial_capital + self.realized,
        });
        Ok(())
    }

    fn record(&mut self, trade: Trade) {
        if let Some(profit) = trade.profit {
            self.realized += profit;
        }
        self.trades.push(trade);
    }
}

/// Resolve `preset` through `registry` and run it over `bars` to completion.
///
/// An unknown strategy name fails before any bar is processed.
pub fn run_backtest(
    bars: &[PriceBar],
    preset: &StrategyPreset,
    registry: &StrategyRegistry,
    settings: &BacktestSettings,
    cancel: &CancelToken,
) -> Result<BacktestResult, RunError> {
    let strategy = registry.build_preset(preset)?;
    BacktestSession::new(bars, &strategy, settings)?.run(cancel)
}
