use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_time: u64,
    pub close_time: u64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    /// Percent move from open to close.
    pub fn change_pct(&self) -> f64 {
        if self.open == 0.0 {
            return 0.0;
        }
        (self.close - self.open) / self.open * 100.0
    }
}

/// How repeated ticks inside one bucket combine their volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePolicy {
    /// Sum every tick's volume, matching real trade-volume aggregation.
    #[default]
    Accumulate,
    /// Keep the largest single tick volume seen in the bucket.
    Max,
}

/// Aggregates ticks into the single open candle of a time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleBuilder {
    candle: Candle,
}

impl CandleBuilder {
    /// Start a new candle. The bucket is aligned to the interval.
    pub fn new(price: f64, volume: f64, timestamp_ms: u64, interval_ms: u64) -> Self {
        assert!(interval_ms > 0, "interval_ms must be > 0");
        let open_time = bucket_start(timestamp_ms, interval_ms);
        Self {
            candle: Candle {
                open: price,
                high: price,
                low: price,
                close: price,
                volume,
                open_time,
                close_time: open_time + interval_ms,
            },
        }
    }

    /// Update the candle with a new tick.
    pub fn update(&mut self, price: f64, volume: f64, policy: VolumePolicy) {
        let c = &mut self.candle;
        c.high = c.high.max(price);
        c.low = c.low.min(price);
        c.close = price;
        c.volume = match policy {
            VolumePolicy::Accumulate => c.volume + volume,
            VolumePolicy::Max => c.volume.max(volume),
        };
    }

    /// Check if a timestamp belongs to this candle's time bucket.
    pub fn contains(&self, timestamp_ms: u64) -> bool {
        timestamp_ms >= self.candle.open_time && timestamp_ms < self.candle.close_time
    }

    pub fn open_time(&self) -> u64 {
        self.candle.open_time
    }

    /// In-progress view without finalizing.
    pub fn candle(&self) -> &Candle {
        &self.candle
    }

    /// Finalize into an immutable Candle.
    pub fn finish(self) -> Candle {
        self.candle
    }
}

pub fn bucket_start(timestamp_ms: u64, interval_ms: u64) -> u64 {
    timestamp_ms - (timestamp_ms % interval_ms)
}
