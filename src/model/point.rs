use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    X,
    O,
}

impl Marker {
    pub fn for_move(delta: f64) -> Self {
        if delta >= 0.0 {
            Marker::X
        } else {
            Marker::O
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Marker::X => "X",
            Marker::O => "O",
        }
    }
}

/// One box of a Point-and-Figure chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnfPoint {
    pub column: u32,
    pub price_level: f64,
    pub marker: Marker,
    pub timestamp_ms: u64,
}
