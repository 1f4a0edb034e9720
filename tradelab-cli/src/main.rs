//! TradeLab CLI: backtest and optimize commands.
//!
//! Commands:
//! - `backtest`: run one strategy preset over a bar series
//! - `optimize`: grid-search a preset's parameters and rank the results
//! - `strategies`: list registered strategy names
//!
//! Bars come from a CSV file (`--data`) or a seeded synthetic random walk
//! (`--synthetic N`). Settings, preset and grid come from a TOML config.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::prelude::*;
use tradelab_core::{PriceBar, StrategyRegistry};
use tradelab_runner::{
    load_bars_csv, run_backtest, synthetic_bars, BacktestResult, CancelToken,
    OptimizationReport, Optimizer, RunConfig, RunId,
};

#[derive(Parser)]
#[command(name = "tradelab", about = "TradeLab CLI: crypto strategy backtesting")]
struct Cli {
    /// Log level: trace, debug, info, warn, error.
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one backtest.
    Backtest {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Grid-search strategy parameters.
    Optimize {
        #[command(flatten)]
        input: InputArgs,

        /// Objective override: totalReturnPct, sharpeRatio or winRate.
        #[arg(long)]
        objective: Option<String>,

        /// Run combinations one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of ranked results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// List registered strategies.
    Strategies,
}

#[derive(Args)]
struct InputArgs {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy name override.
    #[arg(long)]
    strategy: Option<String>,

    /// CSV file with timestamp,open,high,low,close,volume.
    #[arg(long, conflicts_with = "synthetic")]
    data: Option<PathBuf>,

    /// Generate this many synthetic bars instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed label for synthetic bars.
    #[arg(long, default_value = "BTC-USD")]
    seed: String,

    /// Write the full JSON result here.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(cli.log_level));
    tracing_subscriber::registry().with(fmt_layer).init();

    let registry = StrategyRegistry::with_builtins();
    match cli.command {
        Commands::Backtest { input } => run_backtest_cmd(&registry, &input),
        Commands::Optimize {
            input,
            objective,
            sequential,
            top,
        } => run_optimize_cmd(&registry, &input, objective.as_deref(), sequential, top),
        Commands::Strategies => {
            for name in registry.names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn load_config(input: &InputArgs) -> Result<RunConfig> {
    let mut config = match &input.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(name) = &input.strategy {
        config.strategy.name = name.clone();
    }
    Ok(config)
}

fn load_bars(input: &InputArgs) -> Result<Vec<PriceBar>> {
    let bars = match (&input.data, input.synthetic) {
        (Some(path), _) => load_bars_csv(path)
            .with_context(|| format!("loading bars from {}", path.display()))?,
        (None, Some(count)) => synthetic_bars(&input.seed, count, 0, 3_600_000),
        (None, None) => bail!("one of --data or --synthetic is required"),
    };
    info!(bars = bars.len(), "bars loaded");
    Ok(bars)
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("Result saved to: {}", path.display());
    Ok(())
}

fn run_backtest_cmd(registry: &StrategyRegistry, input: &InputArgs) -> Result<()> {
    let config = load_config(input)?;
    let bars = load_bars(input)?;

    let id = RunId::new(&config.strategy, &config.backtest, &bars);
    info!(run_id = %id, strategy = %config.strategy.name, "starting backtest");
    let result = run_backtest(
        &bars,
        &config.strategy,
        registry,
        &config.backtest,
        &CancelToken::new(),
    )?;

    print_summary(&result);
    if let Some(path) = &input.output {
        write_json(&result, path)?;
    }
    Ok(())
}

fn run_optimize_cmd(
    registry: &StrategyRegistry,
    input: &InputArgs,
    objective: Option<&str>,
    sequential: bool,
    top: usize,
) -> Result<()> {
    let config = load_config(input)?;
    let bars = load_bars(input)?;

    let objective = match objective {
        Some(name) => name.parse()?,
        None => config.optimize.objective,
    };
    let report = Optimizer::new(registry)
        .with_settings(config.backtest.clone())
        .with_objective(objective)
        .with_constraints(config.optimize.constraints)
        .parallel(config.optimize.parallel && !sequential)
        .optimize(
            &bars,
            &config.strategy,
            &config.optimize.grid,
            &CancelToken::new(),
        )?;

    print_ranking(&report, &config, top);
    if let Some(path) = &input.output {
        write_json(&report, path)?;
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let p = &result.performance;
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {}", result.strategy);
    println!("Bars:           {}", result.bars_processed);
    println!("Trades:         {} closed", p.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.2}", p.final_equity);
    println!("Total Return:   {:.2} ({:.2}%)", p.total_return, p.total_return_pct);
    println!("Max Drawdown:   {:.2}%", p.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", p.win_rate);
    println!("Profit Factor:  {:.2}", p.profit_factor);
    println!("Sharpe:         {:.3}", p.sharpe_ratio);
    println!("Sortino:        {:.3}", p.sortino_ratio);
    println!("Avg Profit:     {:.2}", p.average_profit);
    println!("Avg Loss:       {:.2}", p.average_loss);
    println!("Max Consec Win: {}", p.max_consecutive_wins);
    println!("Max Consec Loss:{}", p.max_consecutive_losses);
}

fn print_ranking(report: &OptimizationReport, config: &RunConfig, top: usize) {
    println!();
    println!("=== Optimization ({}) ===", report.objective);
    println!(
        "Combinations:   {} ({} completed, {} failed, {} skipped)",
        report.total, report.completed, report.failed, report.skipped
    );

    if !report.constraints.is_empty() {
        println!("Passing:        {}", report.passing().count());
    }

    for (rank, entry) in report.top_n(top).iter().enumerate() {
        let Some(result) = entry.result() else { continue };
        let params: Vec<String> = entry
            .overrides
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "#{:<3} {:>10.3}  return {:>8.2}%  dd {:>6.2}%  [{}]",
            rank + 1,
            report.objective.extract(&result.performance),
            result.performance.total_return_pct,
            result.performance.max_drawdown_pct,
            params.join(", ")
        );
    }

    match report.best() {
        Some(best) => println!("Best:           combination #{}", best.index),
        None => println!("Best:           none (no combination completed)"),
    }
}
