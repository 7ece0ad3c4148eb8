use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrickDirection {
    Up,
    Down,
    Neutral,
}

/// A fixed-height Renko brick. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenkoBrick {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub direction: BrickDirection,
    pub timestamp_ms: u64,
}

impl RenkoBrick {
    /// Build a brick spanning `open` to `close`; high/low follow the direction.
    pub fn between(open: f64, close: f64, timestamp_ms: u64) -> Self {
        let direction = if close > open {
            BrickDirection::Up
        } else if close < open {
            BrickDirection::Down
        } else {
            BrickDirection::Neutral
        };
        Self {
            open,
            close,
            high: open.max(close),
            low: open.min(close),
            direction,
            timestamp_ms,
        }
    }

    pub fn height(&self) -> f64 {
        (self.close - self.open).abs()
    }
}
