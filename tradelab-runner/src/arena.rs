//! Caller-owned storage for completed runs, keyed by content hash.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tradelab_core::{PriceBar, StrategyPreset};

use crate::config::BacktestSettings;
use crate::result::BacktestResult;

/// Deterministic identifier of a run: BLAKE3 over the preset, the settings
/// and every bar field.
///
/// Two runs with equal inputs share an id; any change to any input changes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new(preset: &StrategyPreset, settings: &BacktestSettings, bars: &[PriceBar]) -> Self {
        let mut hasher = blake3::Hasher::new();
        // BTreeMap params serialize in key order, so the JSON is canonical.
        if let Ok(json) = serde_json::to_vec(&(preset, settings)) {
            hasher.update(&json);
        }
        for bar in bars {
            hasher.update(&bar.timestamp.to_le_bytes());
            for v in [bar.open, bar.high, bar.low, bar.close, bar.volume] {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map of finished runs. Results are moved in and handed out by reference
/// or moved back out; nothing is shared between entries.
#[derive(Debug, Default)]
pub struct RunArena {
    runs: HashMap<RunId, BacktestResult>,
}

impl RunArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a result, returning the one it replaced.
    pub fn insert(&mut self, id: RunId, result: BacktestResult) -> Option<BacktestResult> {
        self.runs.insert(id, result)
    }

    pub fn get(&self, id: &RunId) -> Option<&BacktestResult> {
        self.runs.get(id)
    }

    pub fn take(&mut self, id: &RunId) -> Option<BacktestResult> {
        self.runs.remove(id)
    }

    pub fn contains(&self, id: &RunId) -> bool {
        self.runs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Ids in sorted order.
    pub fn ids(&self) -> Vec<&RunId> {
        let mut ids: Vec<&RunId> = self.runs.keys().collect();
        ids.sort();
        ids
    }
}
