use serde::{Deserialize, Serialize};

/// Which side of the market the run is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    None,
    Long,
    Short,
}

/// The single live position of a backtest run.
///
/// `entry_price` is `Some` exactly when `side` is `Long` or `Short`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub side: PositionSide,
    pub entry_price: Option<f64>,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::None
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Profit of closing at `price` with `size` units; 0.0 when flat.
    pub fn profit_at(&self, price: f64, size: f64) -> f64 {
        match (self.side, self.entry_price) {
            (PositionSide::Long, Some(entry)) => (price - entry) * size,
            (PositionSide::Short, Some(entry)) => (entry - price) * size,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_has_no_profit() {
        assert_eq!(Position::flat().profit_at(120.0, 2.0), 0.0);
    }

    #[test]
    fn long_and_short_profit_are_mirrored() {
        let long = Position {
            side: PositionSide::Long,
            entry_price: Some(100.0),
        };
        let short = Position {
            side: PositionSide::Short,
            entry_price: Some(100.0),
        };
        assert_eq!(long.profit_at(110.0, 2.0), 20.0);
        assert_eq!(short.profit_at(110.0, 2.0), -20.0);
    }
}
