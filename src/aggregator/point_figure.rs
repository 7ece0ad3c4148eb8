use super::{is_valid_step, whole_steps, BarBuilder, IgnoreReason, IngestOutcome};
use crate::model::point::{Marker, PnfPoint};
use crate::model::tick::Tick;
use crate::series::BoundedSeries;

#[derive(Debug, Clone, Copy)]
struct PnfState {
    last_price: f64,
    last_marker: Marker,
    column: u32,
}

/// Converts a price stream into X/O Point-and-Figure columns.
///
/// The first tick plots an `X` at column 0. A move of at least one box in
/// either direction plots `floor(move / point_size)` boxes, one box apart and
/// ending at the tick price. A marker change opens the next column first.
#[derive(Debug, Clone)]
pub struct PointFigureAggregator {
    point_size: f64,
    state: Option<PnfState>,
    history: BoundedSeries<PnfPoint>,
}

impl PointFigureAggregator {
    pub fn new(point_size: f64, max_len: usize) -> Self {
        Self {
            point_size,
            state: None,
            history: BoundedSeries::new(max_len),
        }
    }

    pub fn point_size(&self) -> f64 {
        self.point_size
    }

    pub fn column(&self) -> Option<u32> {
        self.state.map(|s| s.column)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.state.map(|s| s.last_price)
    }
}

impl BarBuilder for PointFigureAggregator {
    type Bar = PnfPoint;

    fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        if !is_valid_step(self.point_size) {
            return IngestOutcome::Ignored(IgnoreReason::InvalidConfig);
        }
        if !tick.is_valid() {
            return IngestOutcome::Ignored(IgnoreReason::InvalidTick);
        }

        let Some(mut state) = self.state else {
            self.state = Some(PnfState {
                last_price: tick.price,
                last_marker: Marker::X,
                column: 0,
            });
            self.history.push(PnfPoint {
                column: 0,
                price_level: tick.price,
                marker: Marker::X,
                timestamp_ms: tick.timestamp_ms,
            });
            return IngestOutcome::Emitted(1);
        };

        let delta = tick.price - state.last_price;
        let count = whole_steps(delta, self.point_size);
        if count == 0 {
            return IngestOutcome::Unchanged;
        }

        let marker = Marker::for_move(delta);
        if marker != state.last_marker {
            state.column += 1;
            state.last_marker = marker;
        }

        let step = self.point_size * delta.signum();
        let skipped = count.saturating_sub(self.history.capacity());
        for i in skipped..count {
            let remaining = (count - 1 - i) as f64;
            self.history.push(PnfPoint {
                column: state.column,
                price_level: tick.price - step * remaining,
                marker,
                timestamp_ms: tick.timestamp_ms,
            });
        }
        state.last_price = tick.price;
        self.state = Some(state);

        IngestOutcome::Emitted(count)
    }

    fn flush(&mut self) -> Option<PnfPoint> {
        None
    }

    fn current(&self) -> Option<&PnfPoint> {
        self.history.last()
    }

    fn history(&self) -> &BoundedSeries<PnfPoint> {
        &self.history
    }

    fn reset(&mut self) {
        self.state = None;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(price: f64) -> Tick {
        Tick::new("SOLUSDT", price, 0.0, 0)
    }

    #[test]
    fn first_tick_plots_x_in_column_zero() {
        let mut agg = PointFigureAggregator::new(5.0, 100);
        assert_eq!(agg.ingest(&tick(100.0)), IngestOutcome::Emitted(1));
        let p = agg.current().unwrap();
        assert_eq!((p.column, p.marker, p.price_level), (0, Marker::X, 100.0));
    }

    #[test]
    fn reversal_opens_next_column() {
        let mut agg = PointFigureAggregator::new(5.0, 100);
        agg.ingest(&tick(100.0));
        assert_eq!(agg.ingest(&tick(106.0)), IngestOutcome::Emitted(1));
        assert_eq!(agg.ingest(&tick(101.0)), IngestOutcome::Emitted(1));

        let points = agg.history().to_vec();
        assert_eq!(points.len(), 3);
        assert_eq!((points[1].column, points[1].marker, points[1].price_level), (0, Marker::X, 106.0));
        assert_eq!((points[2].column, points[2].marker, points[2].price_level), (1, Marker::O, 101.0));
    }

    #[test]
    fn multi_box_move_stacks_levels_ending_at_price() {
        let mut agg = PointFigureAggregator::new(5.0, 100);
        agg.ingest(&tick(100.0));
        assert_eq!(agg.ingest(&tick(117.0)), IngestOutcome::Emitted(3));
        let levels: Vec<f64> = agg.history().iter().skip(1).map(|p| p.price_level).collect();
        assert_eq!(levels, vec![107.0, 112.0, 117.0]);
        assert_eq!(agg.column(), Some(0));
        assert_eq!(agg.last_price(), Some(117.0));
    }

    #[test]
    fn sub_box_moves_are_ignored() {
        let mut agg = PointFigureAggregator::new(5.0, 100);
        agg.ingest(&tick(100.0));
        assert_eq!(agg.ingest(&tick(104.9)), IngestOutcome::Unchanged);
        assert_eq!(agg.ingest(&tick(95.1)), IngestOutcome::Unchanged);
        assert_eq!(agg.column(), Some(0));
    }

    #[test]
    fn non_positive_point_size_is_noop() {
        let mut agg = PointFigureAggregator::new(0.0, 100);
        assert_eq!(
            agg.ingest(&tick(100.0)),
            IngestOutcome::Ignored(IgnoreReason::InvalidConfig)
        );
        assert!(agg.history().is_empty());
    }
}
