//! TOML run configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradelab_core::StrategyPreset;

use crate::objective::{Constraints, Objective};
use crate::optimizer::ParameterGrid;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-run engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: f64,
    /// Bars processed between yield points.
    pub batch_size: usize,
    pub risk_free_rate_per_bar: f64,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            batch_size: 1000,
            risk_free_rate_per_bar: 0.0,
        }
    }
}

impl BacktestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be > 0, got {}",
                self.initial_capital
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be >= 1".into()));
        }
        if !self.risk_free_rate_per_bar.is_finite() {
            return Err(ConfigError::Invalid(
                "risk_free_rate_per_bar must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// The `[optimize]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeSection {
    pub objective: Objective,
    pub parallel: bool,
    pub constraints: Constraints,
    pub grid: ParameterGrid,
}

impl Default for OptimizeSection {
    fn default() -> Self {
        Self {
            objective: Objective::default(),
            parallel: true,
            constraints: Constraints::default(),
            grid: ParameterGrid::default(),
        }
    }
}

fn default_strategy() -> StrategyPreset {
    StrategyPreset::new("SuperTrend", BTreeMap::new())
}

/// Complete configuration file: settings, strategy preset, optimizer grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default = "default_strategy")]
    pub strategy: StrategyPreset,
    #[serde(default)]
    pub optimize: OptimizeSection,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSettings::default(),
            strategy: default_strategy(),
            optimize: OptimizeSection::default(),
        }
    }
}

impl RunConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backtest.validate()?;
        if self.strategy.name.trim().is_empty() {
            return Err(ConfigError::Invalid("strategy name is empty".into()));
        }
        for (name, range) in self.optimize.grid.iter() {
            range
                .validate()
                .map_err(|reason| ConfigError::Invalid(format!("grid '{name}': {reason}")))?;
        }
        Ok(())
    }
}
