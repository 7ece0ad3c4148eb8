use rand::rngs::StdRng;
use rand::SeedableRng;

use candlewick::aggregator::{IgnoreReason, IngestOutcome};
use candlewick::engine::{BoxSizes, ChartEngine, ChartSettings, ResetScope, MAX_TRACKED_SYMBOLS};
use candlewick::model::point::Marker;
use candlewick::simulator::{MarketSnapshot, SimulatorParams};

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn started(settings: ChartSettings) -> ChartEngine {
    let mut engine = ChartEngine::new(settings, SimulatorParams::default());
    engine.start(&symbols(&["BTCUSDT", "ETHUSDT"]));
    engine
}

fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
    MarketSnapshot {
        symbol: symbol.to_string(),
        price,
        change_24h_pct: 3.0,
        volume_24h: 5.0e8,
    }
}

#[test]
fn one_tick_feeds_all_three_charts() {
    let mut engine = started(ChartSettings {
        brick_size: 10.0,
        point_size: 5.0,
        ..ChartSettings::default()
    });

    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);
    engine.ingest_tick("BTCUSDT", 106.0, 1.0, 1_000);
    engine.ingest_tick("BTCUSDT", 101.0, 1.0, 2_000);

    let (closed, open) = engine.get_candles("BTCUSDT");
    assert!(closed.is_empty());
    let open = open.unwrap();
    assert!((open.high - 106.0).abs() < f64::EPSILON);
    assert!((open.close - 101.0).abs() < f64::EPSILON);

    assert!(engine.get_renko("BTCUSDT").is_empty());

    let points = engine.get_points("BTCUSDT");
    assert_eq!(points.last().unwrap().column, 1);
    assert_eq!(points.last().unwrap().marker, Marker::O);
}

#[test]
fn symbols_are_independent() {
    let mut engine = started(ChartSettings::default());
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);
    engine.ingest_tick("ETHUSDT", 10.0, 1.0, 0);
    engine.ingest_tick("BTCUSDT", 150.0, 1.0, 500);

    assert_eq!(engine.get_renko("BTCUSDT").len(), 5);
    assert!(engine.get_renko("ETHUSDT").is_empty());
    let (_, eth) = engine.get_candles("ETHUSDT");
    assert!((eth.unwrap().close - 10.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_symbol_reads_are_empty() {
    let engine = started(ChartSettings::default());
    assert_eq!(engine.get_candles("DOGEUSDT"), (Vec::new(), None));
    assert!(engine.get_renko("DOGEUSDT").is_empty());
    assert!(engine.get_points("DOGEUSDT").is_empty());
    assert!(engine.quote("DOGEUSDT").is_none());
}

#[test]
fn start_caps_tracked_symbols() {
    let mut engine = ChartEngine::new(ChartSettings::default(), SimulatorParams::default());
    engine.start(&symbols(&[
        "BTCUSDT", "ETHUSDT", "btcusdt", "SOLUSDT", "BNBUSDT", "XRPUSDT",
    ]));
    assert_eq!(engine.symbols().len(), MAX_TRACKED_SYMBOLS);
    assert_eq!(engine.symbols(), &symbols(&["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT"])[..]);
}

#[test]
fn stop_then_start_begins_fresh() {
    let mut engine = started(ChartSettings::default());
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);
    engine.stop();

    let report = engine.ingest_tick("BTCUSDT", 120.0, 1.0, 1_000);
    assert_eq!(report.candle, IngestOutcome::Ignored(IgnoreReason::Stopped));

    engine.start(&symbols(&["BTCUSDT"]));
    assert!(engine.get_candles("BTCUSDT").1.is_none());
    let report = engine.ingest_tick("BTCUSDT", 120.0, 1.0, 1_000);
    assert_eq!(report.candle, IngestOutcome::Opened);
    assert_eq!(report.renko, IngestOutcome::Seeded);
}

#[test]
fn reconfigure_discards_series_but_keeps_market() {
    let mut engine = started(ChartSettings::default());
    engine.update_market(snapshot("BTCUSDT", 60_000.0));
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);

    engine
        .configure(ChartSettings {
            candle_interval_ms: 60_000,
            ..ChartSettings::default()
        })
        .unwrap();

    assert!(engine.get_candles("BTCUSDT").1.is_none());
    let charts = engine.charts("BTCUSDT").unwrap();
    assert_eq!(charts.candles.interval_ms(), 60_000);
    assert!(charts.market().is_some());
    assert!(charts.sim_state().is_some());
}

#[test]
fn box_size_override_applies_to_one_symbol() {
    let mut engine = started(ChartSettings::default());
    engine
        .set_box_sizes(
            "ethusdt",
            BoxSizes {
                brick_size: 1.0,
                point_size: 0.5,
            },
        )
        .unwrap();
    assert!((engine.box_sizes("ETHUSDT").brick_size - 1.0).abs() < f64::EPSILON);
    assert!((engine.box_sizes("BTCUSDT").brick_size - 10.0).abs() < f64::EPSILON);

    engine.ingest_tick("ETHUSDT", 10.0, 1.0, 0);
    engine.ingest_tick("ETHUSDT", 13.5, 1.0, 1);
    assert_eq!(engine.get_renko("ETHUSDT").len(), 3);

    assert!(engine
        .set_box_sizes(
            "ETHUSDT",
            BoxSizes {
                brick_size: 0.0,
                point_size: 1.0
            }
        )
        .is_err());
}

#[test]
fn reset_symbol_keeps_engine_running() {
    let mut engine = started(ChartSettings::default());
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);
    engine.reset(ResetScope::Symbol("BTCUSDT".to_string()));
    assert!(engine.is_running());
    assert!(engine.get_candles("BTCUSDT").1.is_none());
    assert_eq!(
        engine.ingest_tick("BTCUSDT", 90.0, 1.0, 100).candle,
        IngestOutcome::Opened
    );
}

#[test]
fn simulated_ticks_stay_near_reference() {
    let mut engine = started(ChartSettings::default());
    engine.update_market(snapshot("BTCUSDT", 60_000.0));
    engine.update_market(snapshot("ETHUSDT", 3_000.0));

    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..100u64 {
        assert_eq!(engine.simulate_all(i * 100, &mut rng), 2);
    }

    for (symbol, base) in [("BTCUSDT", 60_000.0), ("ETHUSDT", 3_000.0)] {
        let prices = engine.get_prices(symbol);
        assert_eq!(prices.len(), 100);
        assert!(prices
            .iter()
            .all(|p| (p.price / base - 1.0).abs() <= 0.003 + 1e-12));
    }
}

#[test]
fn quote_and_stats_summarise_open_candles() {
    let mut engine = started(ChartSettings {
        candle_interval_ms: 1_000,
        ..ChartSettings::default()
    });
    engine.ingest_tick("BTCUSDT", 100.0, 2.0, 0);
    engine.ingest_tick("BTCUSDT", 110.0, 3.0, 1_000);
    engine.ingest_tick("BTCUSDT", 121.0, 1.0, 1_500);

    let quote = engine.quote("BTCUSDT").unwrap();
    assert!((quote.price - 121.0).abs() < f64::EPSILON);
    assert!((quote.candle_change_pct - 10.0).abs() < 1e-9);
    // Against the first closed candle's close (100).
    assert!((quote.session_change_pct - 21.0).abs() < 1e-9);

    let stats = engine.stats();
    assert_eq!(stats.total_symbols, 2);
    assert_eq!(stats.active_candles, 1);
    assert_eq!(stats.total_candles, 1);
    assert!((stats.total_volume - 4.0).abs() < f64::EPSILON);
    assert!((stats.avg_candle_change_pct.unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn session_change_falls_back_to_provider_change() {
    let mut engine = started(ChartSettings::default());
    engine.update_market(snapshot("BTCUSDT", 100.0));
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 0);
    let quote = engine.quote("BTCUSDT").unwrap();
    assert!((quote.session_change_pct - 3.0).abs() < f64::EPSILON);
}

#[test]
fn late_tick_is_rejected_by_every_series() {
    let mut engine = started(ChartSettings {
        candle_interval_ms: 60_000,
        ..ChartSettings::default()
    });
    engine.ingest_tick("BTCUSDT", 100.0, 1.0, 120_000);
    let renko_before = engine.get_renko("BTCUSDT").len();
    let points_before = engine.get_points("BTCUSDT").len();

    let report = engine.ingest_tick("BTCUSDT", 150.0, 1.0, 0);
    assert_eq!(report.candle, IngestOutcome::Ignored(IgnoreReason::OutOfOrder));
    assert_eq!(report.renko, IngestOutcome::Ignored(IgnoreReason::OutOfOrder));
    assert_eq!(report.points, IngestOutcome::Ignored(IgnoreReason::OutOfOrder));
    assert!(report.is_rejected());

    assert_eq!(engine.get_renko("BTCUSDT").len(), renko_before);
    assert_eq!(engine.get_points("BTCUSDT").len(), points_before);
    assert_eq!(engine.get_prices("BTCUSDT").len(), 1);

    let report = engine.ingest_tick("BTCUSDT", 125.0, 1.0, 120_500);
    assert_eq!(report.candle, IngestOutcome::Updated);
    assert_eq!(report.renko, IngestOutcome::Emitted(2));
}
