//! ChartEngine
//!
//! Owns every per-symbol aggregation state behind an explicit start/stop
//! lifecycle:
//!   • candle, Renko and Point-and-Figure builders fed from the same ticks
//!   • the raw price comparison series
//!   • the SMA overlay over closed candle closes
//!   • simulator state refreshed from provider snapshots
//!
//! The engine is not shared across tasks. Feeds push ticks into a queue and
//! the single consumer drains it into the engine, so aggregation state is
//! never mutated concurrently.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::aggregator::{
    is_valid_step, BarBuilder, CandleAggregator, IgnoreReason, IngestOutcome,
    PointFigureAggregator, RenkoAggregator,
};
use crate::error::AppError;
use crate::indicator::sma::Sma;
use crate::model::brick::RenkoBrick;
use crate::model::candle::{bucket_start, Candle, VolumePolicy};
use crate::model::point::PnfPoint;
use crate::model::tick::{PricePoint, Tick};
use crate::series::BoundedSeries;
use crate::simulator::{MarketSnapshot, SimState, SimulatorParams, TickSimulator};

/// Dashboard limit on simultaneously tracked symbols.
pub const MAX_TRACKED_SYMBOLS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub candle_interval_ms: u64,
    pub brick_size: f64,
    pub point_size: f64,
    pub history_len: usize,
    pub price_history_len: usize,
    pub volume_policy: VolumePolicy,
    pub sma_period: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            candle_interval_ms: 10_000,
            brick_size: 10.0,
            point_size: 5.0,
            history_len: 100,
            price_history_len: 100,
            volume_policy: VolumePolicy::Accumulate,
            sma_period: 20,
        }
    }
}

impl ChartSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.candle_interval_ms == 0 {
            return Err(AppError::Config("candle interval must be > 0".to_string()));
        }
        self.box_sizes().validate()?;
        if self.history_len == 0 || self.price_history_len == 0 {
            return Err(AppError::Config("history lengths must be > 0".to_string()));
        }
        if self.sma_period == 0 {
            return Err(AppError::Config("sma period must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn box_sizes(&self) -> BoxSizes {
        BoxSizes {
            brick_size: self.brick_size,
            point_size: self.point_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxSizes {
    pub brick_size: f64,
    pub point_size: f64,
}

impl BoxSizes {
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_step(self.brick_size) {
            return Err(AppError::Config(format!(
                "brick size must be > 0, got {}",
                self.brick_size
            )));
        }
        if !is_valid_step(self.point_size) {
            return Err(AppError::Config(format!(
                "point size must be > 0, got {}",
                self.point_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    Symbol(String),
    All,
}

/// Per-builder outcome of one `ingest_tick` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub candle: IngestOutcome,
    pub renko: IngestOutcome,
    pub points: IngestOutcome,
}

impl IngestReport {
    fn rejected(reason: IgnoreReason) -> Self {
        let outcome = IngestOutcome::Ignored(reason);
        Self {
            candle: outcome,
            renko: outcome,
            points: outcome,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.candle.is_ignored() && self.renko.is_ignored() && self.points.is_ignored()
    }
}

/// All chart state for one symbol.
#[derive(Debug, Clone)]
pub struct SymbolCharts {
    pub candles: CandleAggregator,
    pub renko: RenkoAggregator,
    pub points: PointFigureAggregator,
    pub prices: BoundedSeries<PricePoint>,
    sma: Sma,
    sma_value: Option<f64>,
    market: Option<MarketSnapshot>,
    sim: Option<SimState>,
}

impl SymbolCharts {
    fn new(settings: &ChartSettings, sizes: BoxSizes) -> Self {
        Self {
            candles: CandleAggregator::with_policy(
                settings.candle_interval_ms,
                settings.history_len,
                settings.volume_policy,
            ),
            renko: RenkoAggregator::new(sizes.brick_size, settings.history_len),
            points: PointFigureAggregator::new(sizes.point_size, settings.history_len),
            prices: BoundedSeries::new(settings.price_history_len),
            sma: Sma::new(settings.sma_period.max(1)),
            sma_value: None,
            market: None,
            sim: None,
        }
    }

    /// A tick older than the open candle's bucket is rejected for every
    /// series, so the three charts always see the same input.
    fn ingest(&mut self, tick: &Tick) -> IngestReport {
        let interval_ms = self.candles.interval_ms();
        if let Some(open) = self.candles.current() {
            if interval_ms > 0 && bucket_start(tick.timestamp_ms, interval_ms) < open.open_time {
                tracing::debug!(
                    symbol = %tick.symbol,
                    timestamp_ms = tick.timestamp_ms,
                    open_bucket = open.open_time,
                    "Dropping out-of-order tick"
                );
                return IngestReport::rejected(IgnoreReason::OutOfOrder);
            }
        }

        let had_open = self.candles.current().is_some();
        let candle = self.candles.ingest(tick);
        if had_open && candle == IngestOutcome::Opened {
            if let Some(closed) = self.candles.history().last() {
                self.sma_value = self.sma.push(closed.close);
            }
        }

        let renko = self.renko.ingest(tick);
        let points = self.points.ingest(tick);
        if !candle.is_ignored() {
            self.prices.push(PricePoint {
                timestamp_ms: tick.timestamp_ms,
                price: tick.price,
            });
        }

        IngestReport {
            candle,
            renko,
            points,
        }
    }

    pub fn sma(&self) -> Option<f64> {
        self.sma_value
    }

    pub fn market(&self) -> Option<&MarketSnapshot> {
        self.market.as_ref()
    }

    pub fn sim_state(&self) -> Option<&SimState> {
        self.sim.as_ref()
    }
}

/// Display summary for one symbol, derived from its open candle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSummary {
    pub symbol: String,
    pub price: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub candle_change_pct: f64,
    /// Change since the oldest retained closed candle, or the provider's
    /// 24h change while no candle has closed yet.
    pub session_change_pct: f64,
    pub sma: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub active_candles: usize,
    pub total_symbols: usize,
    pub avg_candle_change_pct: Option<f64>,
    pub total_candles: usize,
    pub total_volume: f64,
}

#[derive(Debug)]
pub struct ChartEngine {
    settings: ChartSettings,
    overrides: HashMap<String, BoxSizes>,
    simulator: TickSimulator,
    symbols: Vec<String>,
    charts: HashMap<String, SymbolCharts>,
    running: bool,
}

impl ChartEngine {
    pub fn new(settings: ChartSettings, params: SimulatorParams) -> Self {
        Self {
            settings,
            overrides: HashMap::new(),
            simulator: TickSimulator::new(params),
            symbols: Vec::new(),
            charts: HashMap::new(),
            running: false,
        }
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    /// Replace chart settings. Existing series were built under the old
    /// settings and are discarded; provider snapshots and momentum survive.
    pub fn configure(&mut self, settings: ChartSettings) -> Result<(), AppError> {
        settings.validate()?;
        tracing::info!(
            candle_interval_ms = settings.candle_interval_ms,
            brick_size = settings.brick_size,
            point_size = settings.point_size,
            history_len = settings.history_len,
            "Chart settings applied"
        );
        self.settings = settings;
        self.rebuild_all();
        Ok(())
    }

    /// Override brick/box sizes for one symbol; its Renko and P&F series restart.
    pub fn set_box_sizes(&mut self, symbol: &str, sizes: BoxSizes) -> Result<(), AppError> {
        sizes.validate()?;
        let symbol = normalize_symbol(symbol);
        self.overrides.insert(symbol.clone(), sizes);
        if let Some(charts) = self.charts.get_mut(&symbol) {
            charts.renko = RenkoAggregator::new(sizes.brick_size, self.settings.history_len);
            charts.points = PointFigureAggregator::new(sizes.point_size, self.settings.history_len);
        }
        Ok(())
    }

    pub fn box_sizes(&self, symbol: &str) -> BoxSizes {
        self.overrides
            .get(&normalize_symbol(symbol))
            .copied()
            .unwrap_or_else(|| self.settings.box_sizes())
    }

    pub fn start(&mut self, symbols: &[String]) {
        let mut tracked: Vec<String> = Vec::new();
        for s in symbols.iter().map(|s| normalize_symbol(s)) {
            if !s.is_empty() && !tracked.contains(&s) {
                tracked.push(s);
            }
        }
        if tracked.len() > MAX_TRACKED_SYMBOLS {
            tracing::warn!(
                requested = tracked.len(),
                max = MAX_TRACKED_SYMBOLS,
                "Symbol limit exceeded, extra symbols dropped"
            );
            tracked.truncate(MAX_TRACKED_SYMBOLS);
        }
        for s in &tracked {
            self.ensure_charts(s);
        }
        tracing::info!(symbols = ?tracked, "Chart engine started");
        self.symbols = tracked;
        self.running = true;
    }

    /// Stop and drop all series and simulator state. Ticks still queued
    /// afterwards are rejected with `IgnoreReason::Stopped`.
    pub fn stop(&mut self) {
        self.running = false;
        self.symbols.clear();
        self.charts.clear();
        tracing::info!("Chart engine stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn ingest_tick(
        &mut self,
        symbol: &str,
        price: f64,
        volume: f64,
        timestamp_ms: u64,
    ) -> IngestReport {
        self.ingest(&Tick::new(normalize_symbol(symbol), price, volume, timestamp_ms))
    }

    pub fn ingest(&mut self, tick: &Tick) -> IngestReport {
        if !self.running {
            return IngestReport::rejected(IgnoreReason::Stopped);
        }
        if !tick.is_valid() {
            tracing::debug!(
                symbol = %tick.symbol,
                price = tick.price,
                volume = tick.volume,
                "Dropping invalid tick"
            );
            return IngestReport::rejected(IgnoreReason::InvalidTick);
        }
        self.ensure_charts(&tick.symbol).ingest(tick)
    }

    pub fn get_candles(&self, symbol: &str) -> (Vec<Candle>, Option<Candle>) {
        self.charts(symbol)
            .map(|c| c.candles.snapshot())
            .unwrap_or_default()
    }

    pub fn get_renko(&self, symbol: &str) -> Vec<RenkoBrick> {
        self.charts(symbol)
            .map(|c| c.renko.history().to_vec())
            .unwrap_or_default()
    }

    pub fn get_points(&self, symbol: &str) -> Vec<PnfPoint> {
        self.charts(symbol)
            .map(|c| c.points.history().to_vec())
            .unwrap_or_default()
    }

    pub fn get_prices(&self, symbol: &str) -> Vec<PricePoint> {
        self.charts(symbol)
            .map(|c| c.prices.to_vec())
            .unwrap_or_default()
    }

    pub fn charts(&self, symbol: &str) -> Option<&SymbolCharts> {
        self.charts.get(&normalize_symbol(symbol))
    }

    /// Clear series and simulator state for the scope.
    pub fn reset(&mut self, scope: ResetScope) {
        match scope {
            ResetScope::Symbol(symbol) => {
                let symbol = normalize_symbol(&symbol);
                if self.charts.remove(&symbol).is_some() {
                    tracing::info!(symbol = %symbol, "Symbol charts reset");
                }
            }
            ResetScope::All => {
                self.charts.clear();
                tracing::info!("All charts reset");
            }
        }
    }

    /// Store a fresh provider quote as the simulator's reference.
    pub fn update_market(&mut self, snapshot: MarketSnapshot) {
        if !self.running || !(snapshot.price.is_finite() && snapshot.price > 0.0) {
            return;
        }
        let charts = self.ensure_charts(&normalize_symbol(&snapshot.symbol));
        match charts.sim.as_mut() {
            Some(sim) => sim.refresh(&snapshot),
            None => charts.sim = Some(SimState::from_snapshot(&snapshot)),
        }
        charts.market = Some(snapshot);
    }

    /// Step the simulator for one symbol and ingest the synthetic tick.
    pub fn simulate_tick<R: Rng + ?Sized>(
        &mut self,
        symbol: &str,
        timestamp_ms: u64,
        rng: &mut R,
    ) -> Option<IngestReport> {
        if !self.running {
            return None;
        }
        let symbol = normalize_symbol(symbol);
        let charts = self.charts.get_mut(&symbol)?;
        let sim = charts.sim.as_mut()?;
        let step = self.simulator.step(sim, rng)?;
        sim.momentum = step.momentum;

        let tick = Tick::new(symbol, step.price, step.volume, timestamp_ms);
        Some(charts.ingest(&tick))
    }

    /// Simulate one tick for every tracked symbol with a reference quote.
    pub fn simulate_all<R: Rng + ?Sized>(&mut self, timestamp_ms: u64, rng: &mut R) -> usize {
        let symbols = self.symbols.clone();
        symbols
            .iter()
            .filter_map(|s| self.simulate_tick(s, timestamp_ms, rng))
            .filter(|r| !r.is_rejected())
            .count()
    }

    pub fn quote(&self, symbol: &str) -> Option<QuoteSummary> {
        let charts = self.charts(symbol)?;
        let current = charts.candles.current()?;

        let session_change_pct = match charts.candles.history().first() {
            Some(first) if first.close > 0.0 => (current.close - first.close) / first.close * 100.0,
            _ => charts.market.as_ref().map_or(0.0, |m| m.change_24h_pct),
        };

        Some(QuoteSummary {
            symbol: normalize_symbol(symbol),
            price: current.close,
            open: current.open,
            high: current.high,
            low: current.low,
            close: current.close,
            volume: current.volume,
            candle_change_pct: current.change_pct(),
            session_change_pct,
            sma: charts.sma_value,
        })
    }

    pub fn stats(&self) -> DashboardStats {
        let quotes: Vec<QuoteSummary> = self.symbols.iter().filter_map(|s| self.quote(s)).collect();
        let total_candles = self
            .symbols
            .iter()
            .filter_map(|s| self.charts(s))
            .map(|c| c.candles.history().len())
            .sum();
        let avg_candle_change_pct = (!quotes.is_empty()).then(|| {
            quotes.iter().map(|q| q.candle_change_pct).sum::<f64>() / quotes.len() as f64
        });

        DashboardStats {
            active_candles: quotes.len(),
            total_symbols: self.symbols.len(),
            avg_candle_change_pct,
            total_candles,
            total_volume: quotes.iter().map(|q| q.volume).sum(),
        }
    }

    fn ensure_charts(&mut self, symbol: &str) -> &mut SymbolCharts {
        let sizes = self.box_sizes(symbol);
        let settings = &self.settings;
        self.charts
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolCharts::new(settings, sizes))
    }

    fn rebuild_all(&mut self) {
        let symbols: Vec<String> = self.charts.keys().cloned().collect();
        for symbol in symbols {
            let sizes = self.box_sizes(&symbol);
            if let Some(old) = self.charts.remove(&symbol) {
                let mut fresh = SymbolCharts::new(&self.settings, sizes);
                fresh.market = old.market;
                fresh.sim = old.sim;
                self.charts.insert(symbol, fresh);
            }
        }
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
