//! Signal generation.
//!
//! A signal is a directional instruction for the position tracker. Signal
//! rules never see the position or the account; they depend only on bars and
//! precomputed indicators.

pub mod strength;
pub mod supertrend;

use serde::{Deserialize, Serialize};

pub use strength::{trend_strength, TREND_STRENGTH_LOOKBACK};
pub use supertrend::supertrend_signal;

/// Directional trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn is_hold(&self) -> bool {
        matches!(self, Self::Hold)
    }
}
