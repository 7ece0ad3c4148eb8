use super::{is_valid_step, whole_steps, BarBuilder, IgnoreReason, IngestOutcome};
use crate::model::brick::RenkoBrick;
use crate::model::tick::Tick;
use crate::series::BoundedSeries;

/// Converts a price stream into fixed-size Renko bricks, ignoring time.
///
/// The first tick seeds the reference close silently. Each later tick emits
/// one brick per whole `brick_size` moved from the last brick close, in the
/// direction of the move; the fractional remainder is discarded. A single
/// brick of opposite movement flips direction (no two-brick reversal rule).
#[derive(Debug, Clone)]
pub struct RenkoAggregator {
    brick_size: f64,
    last_close: Option<f64>,
    history: BoundedSeries<RenkoBrick>,
}

impl RenkoAggregator {
    pub fn new(brick_size: f64, max_len: usize) -> Self {
        Self {
            brick_size,
            last_close: None,
            history: BoundedSeries::new(max_len),
        }
    }

    pub fn brick_size(&self) -> f64 {
        self.brick_size
    }

    /// Close of the most recent brick (or the seed price).
    pub fn last_close(&self) -> Option<f64> {
        self.last_close
    }
}

impl BarBuilder for RenkoAggregator {
    type Bar = RenkoBrick;

    fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        if !is_valid_step(self.brick_size) {
            return IngestOutcome::Ignored(IgnoreReason::InvalidConfig);
        }
        if !tick.is_valid() {
            return IngestOutcome::Ignored(IgnoreReason::InvalidTick);
        }

        let Some(anchor) = self.last_close else {
            self.last_close = Some(tick.price);
            return IngestOutcome::Seeded;
        };

        let delta = tick.price - anchor;
        let count = whole_steps(delta, self.brick_size);
        if count == 0 {
            return IngestOutcome::Unchanged;
        }

        let step = self.brick_size * delta.signum();
        // Levels are derived from the anchor, not chained, so each brick
        // height stays within float noise of brick_size. Bricks that would be
        // evicted by the same tick are skipped.
        let skipped = count.saturating_sub(self.history.capacity());
        let mut open = anchor + step * skipped as f64;
        for i in skipped + 1..=count {
            let close = anchor + step * i as f64;
            self.history
                .push(RenkoBrick::between(open, close, tick.timestamp_ms));
            open = close;
        }
        self.last_close = Some(open);

        tracing::trace!(
            symbol = %tick.symbol,
            bricks = count,
            last_close = open,
            "Renko bricks emitted"
        );
        IngestOutcome::Emitted(count)
    }

    fn flush(&mut self) -> Option<RenkoBrick> {
        None
    }

    fn current(&self) -> Option<&RenkoBrick> {
        self.history.last()
    }

    fn history(&self) -> &BoundedSeries<RenkoBrick> {
        &self.history
    }

    fn reset(&mut self) {
        self.last_close = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::brick::BrickDirection;

    fn tick(price: f64) -> Tick {
        Tick::new("ETHUSDT", price, 0.0, 0)
    }

    #[test]
    fn seeds_silently_then_stacks_bricks() {
        let mut agg = RenkoAggregator::new(10.0, 100);
        assert_eq!(agg.ingest(&tick(100.0)), IngestOutcome::Seeded);
        assert!(agg.history().is_empty());

        assert_eq!(agg.ingest(&tick(125.0)), IngestOutcome::Emitted(2));
        let bricks = agg.history().to_vec();
        assert_eq!((bricks[0].open, bricks[0].close), (100.0, 110.0));
        assert_eq!((bricks[1].open, bricks[1].close), (110.0, 120.0));
        assert!(bricks.iter().all(|b| b.direction == BrickDirection::Up));
        assert_eq!(agg.last_close(), Some(120.0));
    }

    #[test]
    fn small_moves_do_not_emit() {
        let mut agg = RenkoAggregator::new(10.0, 100);
        agg.ingest(&tick(100.0));
        assert_eq!(agg.ingest(&tick(109.9)), IngestOutcome::Unchanged);
        assert_eq!(agg.ingest(&tick(90.1)), IngestOutcome::Unchanged);
        assert_eq!(agg.last_close(), Some(100.0));
    }

    #[test]
    fn single_brick_reversal_flips_direction() {
        let mut agg = RenkoAggregator::new(10.0, 100);
        agg.ingest(&tick(100.0));
        agg.ingest(&tick(120.0));
        assert_eq!(agg.ingest(&tick(109.0)), IngestOutcome::Emitted(1));
        let last = agg.current().unwrap();
        assert_eq!(last.direction, BrickDirection::Down);
        assert_eq!((last.open, last.close, last.high, last.low), (120.0, 110.0, 120.0, 110.0));
    }

    #[test]
    fn non_positive_brick_size_is_noop() {
        for size in [0.0, -1.0, f64::NAN] {
            let mut agg = RenkoAggregator::new(size, 100);
            assert_eq!(
                agg.ingest(&tick(100.0)),
                IngestOutcome::Ignored(IgnoreReason::InvalidConfig)
            );
            assert!(agg.last_close().is_none());
        }
    }
}
