use super::{BarBuilder, IgnoreReason, IngestOutcome};
use crate::model::candle::{bucket_start, Candle, CandleBuilder, VolumePolicy};
use crate::model::tick::Tick;
use crate::series::BoundedSeries;

/// Buckets ticks into fixed-duration OHLCV candles.
///
/// Exactly one candle is open at a time. It is finalized into history the
/// moment a tick lands in a later bucket. Ticks older than the open bucket
/// are dropped rather than rewriting history.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval_ms: u64,
    policy: VolumePolicy,
    open: Option<CandleBuilder>,
    history: BoundedSeries<Candle>,
}

impl CandleAggregator {
    pub fn new(interval_ms: u64, max_len: usize) -> Self {
        Self::with_policy(interval_ms, max_len, VolumePolicy::default())
    }

    pub fn with_policy(interval_ms: u64, max_len: usize, policy: VolumePolicy) -> Self {
        Self {
            interval_ms,
            policy,
            open: None,
            history: BoundedSeries::new(max_len),
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn policy(&self) -> VolumePolicy {
        self.policy
    }

    /// Closed candles plus the in-progress one.
    pub fn snapshot(&self) -> (Vec<Candle>, Option<Candle>) {
        (self.history.to_vec(), self.current().cloned())
    }
}

impl BarBuilder for CandleAggregator {
    type Bar = Candle;

    fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        if self.interval_ms == 0 {
            return IngestOutcome::Ignored(IgnoreReason::InvalidConfig);
        }
        if !tick.is_valid() {
            return IngestOutcome::Ignored(IgnoreReason::InvalidTick);
        }

        let bucket = bucket_start(tick.timestamp_ms, self.interval_ms);
        let open_bucket = self.open.as_ref().map(CandleBuilder::open_time);
        match open_bucket {
            Some(open_time) if bucket == open_time => {
                if let Some(cb) = self.open.as_mut() {
                    cb.update(tick.price, tick.volume, self.policy);
                }
                IngestOutcome::Updated
            }
            Some(open_time) if bucket < open_time => {
                tracing::debug!(
                    symbol = %tick.symbol,
                    timestamp_ms = tick.timestamp_ms,
                    open_bucket = open_time,
                    "Dropping out-of-order tick"
                );
                IngestOutcome::Ignored(IgnoreReason::OutOfOrder)
            }
            _ => {
                self.flush();
                self.open = Some(CandleBuilder::new(
                    tick.price,
                    tick.volume,
                    tick.timestamp_ms,
                    self.interval_ms,
                ));
                IngestOutcome::Opened
            }
        }
    }

    fn flush(&mut self) -> Option<Candle> {
        let candle = self.open.take()?.finish();
        self.history.push(candle.clone());
        Some(candle)
    }

    fn current(&self) -> Option<&Candle> {
        self.open.as_ref().map(|cb| cb.candle())
    }

    fn history(&self) -> &BoundedSeries<Candle> {
        &self.history
    }

    fn reset(&mut self) {
        self.open = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(price: f64, volume: f64, ts: u64) -> Tick {
        Tick::new("BTCUSDT", price, volume, ts)
    }

    #[test]
    fn closes_bucket_when_later_tick_arrives() {
        let mut agg = CandleAggregator::new(60_000, 100);
        assert_eq!(agg.ingest(&tick(100.0, 1.0, 0)), IngestOutcome::Opened);
        assert_eq!(agg.ingest(&tick(110.0, 1.0, 30_000)), IngestOutcome::Updated);
        assert_eq!(agg.ingest(&tick(90.0, 1.0, 61_000)), IngestOutcome::Opened);

        let (closed, open) = agg.snapshot();
        assert_eq!(closed.len(), 1);
        let c = &closed[0];
        assert_eq!(c.open_time, 0);
        assert_eq!((c.open, c.high, c.low, c.close), (100.0, 110.0, 100.0, 110.0));
        assert!((c.volume - 2.0).abs() < f64::EPSILON);

        let open = open.unwrap();
        assert_eq!(open.open_time, 60_000);
        assert_eq!((open.open, open.high, open.low, open.close), (90.0, 90.0, 90.0, 90.0));
    }

    #[test]
    fn out_of_order_tick_is_ignored() {
        let mut agg = CandleAggregator::new(10_000, 100);
        agg.ingest(&tick(100.0, 1.0, 25_000));
        let before = agg.current().cloned();
        assert_eq!(
            agg.ingest(&tick(50.0, 1.0, 5_000)),
            IngestOutcome::Ignored(IgnoreReason::OutOfOrder)
        );
        assert_eq!(agg.current().cloned(), before);
        assert!(agg.history().is_empty());
    }

    #[test]
    fn zero_interval_is_noop() {
        let mut agg = CandleAggregator::new(0, 100);
        assert_eq!(
            agg.ingest(&tick(100.0, 1.0, 0)),
            IngestOutcome::Ignored(IgnoreReason::InvalidConfig)
        );
        assert!(agg.current().is_none());
    }

    #[test]
    fn flush_moves_open_candle_into_history() {
        let mut agg = CandleAggregator::new(1_000, 10);
        agg.ingest(&tick(5.0, 1.0, 100));
        let flushed = agg.flush().unwrap();
        assert_eq!(flushed.open, 5.0);
        assert!(agg.current().is_none());
        assert_eq!(agg.history().len(), 1);
        assert!(agg.flush().is_none());
    }
}
