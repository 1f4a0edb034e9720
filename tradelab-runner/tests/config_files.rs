//! Loading configuration and bar files from disk.

use std::io::Write;

use tempfile::NamedTempFile;
use tradelab_core::StrategyRegistry;
use tradelab_runner::{
    load_bars_csv, run_backtest, CancelToken, ConfigError, DataError, Objective, Optimizer,
    RunConfig,
};

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const CSV: &str = "\
timestamp,open,high,low,close,volume
2024-01-01,100,101,99,100,10
2024-01-02,100,101,97,98,10
2024-01-03,98,99,95,96,10
2024-01-04,96,101,95,100,10
2024-01-05,100,105,99,104,10
";

#[test]
fn config_file_drives_a_run() {
    let config_file = temp_file(
        r#"
[backtest]
initial_capital = 1000.0
batch_size = 2

[strategy]
name = "rsi"
[strategy.params]
rsiPeriod = 2
"#,
    );
    let config = RunConfig::load(config_file.path()).unwrap();
    let csv_file = temp_file(CSV);
    let bars = load_bars_csv(csv_file.path()).unwrap();
    assert_eq!(bars.len(), 5);

    let result = run_backtest(
        &bars,
        &config.strategy,
        &StrategyRegistry::with_builtins(),
        &config.backtest,
        &CancelToken::new(),
    )
    .unwrap();
    assert_eq!(result.strategy, "RSI");
    assert_eq!(result.performance.initial_capital, 1000.0);
    assert_eq!(result.performance.final_equity, 1008.0);
}

#[test]
fn config_file_drives_an_optimization() {
    let config_file = temp_file(
        r#"
[strategy]
name = "RSI"
[strategy.params]
rsiPeriod = 2

[optimize]
objective = "totalReturnPct"
parallel = true
[optimize.grid]
positionSize = { min = 0.5, max = 2.0, step = 0.5 }
"#,
    );
    let config = RunConfig::load(config_file.path()).unwrap();
    assert_eq!(config.optimize.objective, Objective::TotalReturnPct);

    let bars = load_bars_csv(temp_file(CSV).path()).unwrap();
    let registry = StrategyRegistry::with_builtins();
    let report = Optimizer::new(&registry)
        .with_settings(config.backtest.clone())
        .with_objective(config.optimize.objective)
        .parallel(config.optimize.parallel)
        .optimize(&bars, &config.strategy, &config.optimize.grid, &CancelToken::new())
        .unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.best().unwrap().overrides["positionSize"], 2.0);
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = temp_file("[backtest\ninitial_capital = ");
    assert!(matches!(RunConfig::load(file.path()), Err(ConfigError::Parse(_))));
}

#[test]
fn malformed_csv_is_reported() {
    let file = temp_file("timestamp,open,high,low,close,volume\n2024-01-01,abc,1,1,1,1\n");
    assert!(matches!(load_bars_csv(file.path()), Err(DataError::Csv(_))));
}

#[test]
fn missing_csv_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("bars.csv");
    assert!(matches!(load_bars_csv(&missing), Err(DataError::Io { .. })));
}
