use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use candlewick::config::{Config, FeedMode};
use candlewick::engine::{ChartEngine, ResetScope};
use candlewick::event::AppEvent;
use candlewick::feed::rest::{BinanceTickerProvider, CoinGeckoProvider};
use candlewick::feed::ws::BinanceTickerStream;
use candlewick::feed::{ProviderChain, ProviderResult};
use candlewick::input::{parse_command, UiCommand};
use candlewick::logging;
use candlewick::model::tick::Tick;
use candlewick::ui::{self, DashboardState};

const APP_EVENT_CAPACITY: usize = 256;
const TICK_QUEUE_CAPACITY: usize = 1024;

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn build_provider_chain(config: &Config) -> ProviderChain {
    let timeout = Duration::from_secs(config.feed.http_timeout_secs);
    let mut chain = ProviderChain::new();
    for name in &config.feed.providers {
        match name.trim().to_ascii_lowercase().as_str() {
            "coingecko" => {
                chain = chain.with(Box::new(CoinGeckoProvider::new(
                    &config.feed.coingecko_base_url,
                    config.feed.coingecko_api_key.clone(),
                    timeout,
                )));
            }
            "binance" => {
                chain = chain.with(Box::new(BinanceTickerProvider::new(
                    &config.feed.binance_rest_base_url,
                    timeout,
                )));
            }
            other => tracing::warn!(provider = %other, "Unknown provider ignored"),
        }
    }
    chain
}

/// Poll reference quotes until shutdown. A bump on `refresh_rx` forces an early poll.
fn spawn_provider_poller(
    chain: ProviderChain,
    symbols: Vec<String>,
    interval: Duration,
    app_tx: mpsc::Sender<AppEvent>,
    mut refresh_rx: watch::Receiver<u64>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match chain.fetch(&symbols).await {
                ProviderResult::Available(quotes) => {
                    tracing::debug!(count = quotes.len(), "Reference quotes refreshed");
                    for quote in quotes {
                        if app_tx.send(AppEvent::Market(quote)).await.is_err() {
                            return;
                        }
                    }
                }
                ProviderResult::Unavailable(reason) => {
                    tracing::warn!(reason = %reason, "All price providers unavailable");
                    if app_tx
                        .send(AppEvent::ProvidersUnavailable(reason))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = refresh_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    })
}

fn spawn_ticker_stream(
    config: &Config,
    symbols: &[String],
    tick_tx: mpsc::Sender<Tick>,
    app_tx: mpsc::Sender<AppEvent>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let stream = BinanceTickerStream::new(&config.feed.binance_ws_base_url, symbols);
    tracing::info!(url = %stream.url(), "Starting ticker stream");
    tokio::spawn(async move {
        if let Err(e) = stream.connect_and_run(tick_tx, app_tx, shutdown).await {
            tracing::error!(error = %e, "Ticker stream exited");
        }
    })
}

fn handle_command(
    cmd: UiCommand,
    engine: &mut ChartEngine,
    state: &mut DashboardState,
    symbols: &[String],
    refresh_tx: &watch::Sender<u64>,
) {
    match cmd {
        UiCommand::Quit => {}
        UiCommand::ToggleRunning => {
            if engine.is_running() {
                engine.stop();
                state.push_log("Aggregation stopped");
            } else {
                engine.start(symbols);
                refresh_tx.send_modify(|n| *n += 1);
                state.push_log("Aggregation started");
            }
        }
        UiCommand::NextView => state.view = state.view.next(),
        UiCommand::NextSymbol => state.select_next(),
        UiCommand::PrevSymbol => state.select_prev(),
        UiCommand::ResetSymbol => {
            if let Some(symbol) = state.selected_view().map(|v| v.symbol.clone()) {
                engine.reset(ResetScope::Symbol(symbol.clone()));
                refresh_tx.send_modify(|n| *n += 1);
                state.push_log(format!("Reset {}", symbol));
            }
        }
        UiCommand::ResetAll => {
            engine.reset(ResetScope::All);
            refresh_tx.send_modify(|n| *n += 1);
            state.push_log("Reset all charts");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists and is valid");
            std::process::exit(1);
        }
    };

    logging::init(&config.logging)?;

    let symbols = config.feed.tracked_symbols();
    tracing::info!(
        mode = ?config.feed.mode,
        symbols = ?symbols,
        candle_interval = %config.chart.candle_interval,
        "Starting candlewick"
    );

    let mut engine = ChartEngine::new(config.chart.settings()?, config.simulator);
    for (symbol, sizes) in config.chart.box_overrides() {
        engine.set_box_sizes(&symbol, sizes)?;
    }
    engine.start(&symbols);

    // Channels
    let (app_tx, mut app_rx) = mpsc::channel::<AppEvent>(APP_EVENT_CAPACITY);
    let (tick_tx, mut tick_rx) = mpsc::channel::<Tick>(TICK_QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (refresh_tx, refresh_rx) = watch::channel(0u64);

    let feed_label = match config.feed.mode {
        FeedMode::Simulated => {
            let chain = build_provider_chain(&config);
            let label = format!("simulated via {}", chain.names().join(" > "));
            spawn_provider_poller(
                chain,
                symbols.clone(),
                Duration::from_secs(config.feed.refresh_secs),
                app_tx.clone(),
                refresh_rx,
                shutdown_rx.clone(),
            );
            label
        }
        FeedMode::Live => {
            spawn_ticker_stream(
                &config,
                &symbols,
                tick_tx.clone(),
                app_tx.clone(),
                shutdown_rx.clone(),
            );
            "live binance".to_string()
        }
    };

    // Ctrl+C handler
    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let mut terminal = ratatui::init();
    let mut state = DashboardState::new(&feed_label);
    let mut rng = StdRng::from_entropy();
    state.push_log(format!("candlewick started | {}", feed_label));

    let loop_result: Result<()> = loop {
        while let Ok(event) = app_rx.try_recv() {
            if let AppEvent::Market(snapshot) = &event {
                engine.update_market(snapshot.clone());
            }
            state.apply(&event);
        }

        while let Ok(tick) = tick_rx.try_recv() {
            if !engine.ingest(&tick).is_rejected() {
                state.tick_count += 1;
            }
        }

        if config.feed.mode == FeedMode::Simulated && engine.is_running() {
            state.tick_count += engine.simulate_all(now_ms(), &mut rng) as u64;
        }

        state.refresh(&engine);
        if let Err(e) = terminal.draw(|frame| ui::render(frame, &state)) {
            break Err(e.into());
        }

        let ready = match crossterm::event::poll(Duration::from_millis(config.ui.refresh_rate_ms)) {
            Ok(ready) => ready,
            Err(e) => break Err(e.into()),
        };
        if ready {
            match crossterm::event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match parse_command(&key.code) {
                        Some(UiCommand::Quit) => {
                            tracing::info!("User quit");
                            break Ok(());
                        }
                        Some(cmd) => {
                            handle_command(cmd, &mut engine, &mut state, &symbols, &refresh_tx)
                        }
                        None => {}
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }
        }

        if *shutdown_rx.borrow() {
            break Ok(());
        }
    };

    let _ = shutdown_tx.send(true);
    ratatui::restore();
    tracing::info!("Shutdown complete");
    println!("Goodbye! Check {} for details.", config.logging.file);
    loop_result
}
