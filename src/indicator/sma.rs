use crate::series::BoundedSeries;

/// Simple moving average over the last `period` values.
///
/// Shares the bounded-series eviction so the running sum always matches the
/// window contents.
#[derive(Debug, Clone)]
pub struct Sma {
    window: BoundedSeries<f64>,
    period: usize,
    sum: f64,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "SMA period must be > 0");
        Self {
            window: BoundedSeries::new(period),
            period,
            sum: 0.0,
        }
    }

    /// Push a new value, return the current SMA if enough data.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.sum += value;
        if let Some(evicted) = self.window.push(value) {
            self.sum -= evicted;
        }
        self.value()
    }

    pub fn value(&self) -> Option<f64> {
        self.is_ready().then(|| self.sum / self.period as f64)
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.period
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
    }
}
