//! Tick-to-bar builders.
//!
//! Every chart type is one [`BarBuilder`] strategy that owns its bounded
//! history. A builder is per-symbol; the engine keeps one of each per symbol
//! and feeds them the same ticks.

pub mod candle;
pub mod point_figure;
pub mod renko;

use crate::model::tick::Tick;
use crate::series::BoundedSeries;

pub use candle::CandleAggregator;
pub use point_figure::PointFigureAggregator;
pub use renko::RenkoAggregator;

/// Floating tolerance used when counting whole box/brick multiples.
pub(crate) const STEP_EPSILON: f64 = 1e-9;

/// Why a tick did not change builder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Non-positive/non-finite price or negative volume.
    InvalidTick,
    /// Timestamp falls before the currently open bucket.
    OutOfOrder,
    /// Interval, brick size or box size is not strictly positive.
    InvalidConfig,
    /// The engine is not running.
    Stopped,
}

/// Result of feeding one tick to a builder. Never an error: every rejection
/// is absorbed locally and reported here for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The first tick established the reference level; nothing emitted.
    Seeded,
    /// A new open bar was started (candles).
    Opened,
    /// The open bar was updated in place (candles).
    Updated,
    /// The tick moved price less than one step (Renko / P&F).
    Unchanged,
    /// This many immutable entries were appended to history.
    Emitted(usize),
    Ignored(IgnoreReason),
}

impl IngestOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, IngestOutcome::Ignored(_))
    }
}

pub trait BarBuilder {
    type Bar: Clone;

    fn ingest(&mut self, tick: &Tick) -> IngestOutcome;

    /// Finalize whatever is in progress into history.
    fn flush(&mut self) -> Option<Self::Bar>;

    /// The in-progress bar, or the most recent emitted one for builders
    /// whose entries are immutable at creation.
    fn current(&self) -> Option<&Self::Bar>;

    fn history(&self) -> &BoundedSeries<Self::Bar>;

    fn reset(&mut self);
}

/// Number of whole `step`s in `distance`, tolerant to float noise just below
/// an exact multiple.
pub(crate) fn whole_steps(distance: f64, step: f64) -> usize {
    let n = (distance.abs() / step + STEP_EPSILON).floor();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

pub(crate) fn is_valid_step(step: f64) -> bool {
    step.is_finite() && step > 0.0
}
