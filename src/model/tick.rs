use serde::{Deserialize, Serialize};

/// A single price observation, live or simulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub timestamp_ms: u64,
}

impl Tick {
    pub fn new(symbol: impl Into<String>, price: f64, volume: f64, timestamp_ms: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            timestamp_ms,
        }
    }

    /// Price must be finite and strictly positive, volume finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && self.volume.is_finite() && self.volume >= 0.0
    }
}

/// Raw price sample kept for the line comparison series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: u64,
    pub price: f64,
}
