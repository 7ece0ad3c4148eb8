pub mod chart;
pub mod dashboard;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::engine::{ChartEngine, DashboardStats, QuoteSummary};
use crate::event::{AppEvent, WsConnectionStatus};
use crate::model::brick::RenkoBrick;
use crate::model::candle::Candle;
use crate::model::point::PnfPoint;
use crate::model::tick::PricePoint;
use crate::series::BoundedSeries;

use chart::{CandleChart, PointFigureChart, PriceLineChart, RenkoChart};
use dashboard::{KeybindBar, LogPanel, QuoteBar, StatsBar, StatusBar};

const MAX_LOG_MESSAGES: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartView {
    #[default]
    Candles,
    Renko,
    PointFigure,
    Line,
}

impl ChartView {
    pub fn next(self) -> Self {
        match self {
            ChartView::Candles => ChartView::Renko,
            ChartView::Renko => ChartView::PointFigure,
            ChartView::PointFigure => ChartView::Line,
            ChartView::Line => ChartView::Candles,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartView::Candles => "candles",
            ChartView::Renko => "renko",
            ChartView::PointFigure => "p&f",
            ChartView::Line => "line",
        }
    }
}

/// Render-ready copy of one symbol's series.
#[derive(Debug, Clone, Default)]
pub struct SymbolView {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub current: Option<Candle>,
    pub bricks: Vec<RenkoBrick>,
    pub brick_size: f64,
    pub points: Vec<PnfPoint>,
    pub point_size: f64,
    pub prices: Vec<PricePoint>,
    pub sma: Option<f64>,
}

/// Everything the dashboard draws, projected from the engine each frame.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub feed_label: String,
    pub running: bool,
    pub ws_status: Option<WsConnectionStatus>,
    pub view: ChartView,
    pub selected: usize,
    pub tick_count: u64,
    pub dropped_ticks: u64,
    pub symbols: Vec<SymbolView>,
    pub quotes: Vec<QuoteSummary>,
    pub stats: DashboardStats,
    pub log_messages: BoundedSeries<String>,
}

impl DashboardState {
    pub fn new(feed_label: &str) -> Self {
        Self {
            feed_label: feed_label.to_string(),
            running: false,
            ws_status: None,
            view: ChartView::default(),
            selected: 0,
            tick_count: 0,
            dropped_ticks: 0,
            symbols: Vec::new(),
            quotes: Vec::new(),
            stats: DashboardStats::default(),
            log_messages: BoundedSeries::new(MAX_LOG_MESSAGES),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.log_messages.push(format!("{} {}", stamp, msg.into()));
    }

    /// Re-project all series from the engine.
    pub fn refresh(&mut self, engine: &ChartEngine) {
        self.running = engine.is_running();
        self.symbols = engine
            .symbols()
            .iter()
            .map(|symbol| {
                let (candles, current) = engine.get_candles(symbol);
                let sizes = engine.box_sizes(symbol);
                SymbolView {
                    symbol: symbol.clone(),
                    candles,
                    current,
                    bricks: engine.get_renko(symbol),
                    brick_size: sizes.brick_size,
                    points: engine.get_points(symbol),
                    point_size: sizes.point_size,
                    prices: engine.get_prices(symbol),
                    sma: engine.charts(symbol).and_then(|c| c.sma()),
                }
            })
            .collect();
        self.quotes = engine
            .symbols()
            .iter()
            .filter_map(|s| engine.quote(s))
            .collect();
        self.stats = engine.stats();
        if self.selected >= self.symbols.len() {
            self.selected = 0;
        }
    }

    pub fn apply(&mut self, event: &AppEvent) {
        match event {
            AppEvent::WsStatus(status) => {
                if self.ws_status.as_ref() != Some(status) {
                    self.push_log(format!("WS {:?}", status));
                }
                self.ws_status = Some(status.clone());
            }
            AppEvent::TickDropped => self.dropped_ticks += 1,
            AppEvent::LogMessage(msg) => self.push_log(msg.clone()),
            AppEvent::ProvidersUnavailable(reason) => {
                self.push_log(format!("Providers unavailable: {}", reason));
            }
            AppEvent::Market(_) => {}
        }
    }

    pub fn select_next(&mut self) {
        if !self.symbols.is_empty() {
            self.selected = (self.selected + 1) % self.symbols.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.symbols.is_empty() {
            self.selected = (self.selected + self.symbols.len() - 1) % self.symbols.len();
        }
    }

    pub fn selected_view(&self) -> Option<&SymbolView> {
        self.symbols.get(self.selected)
    }
}

/// "BTCUSDT" -> "BTC/USD", as shown on the dashboard.
pub fn display_pair(symbol: &str) -> String {
    match symbol.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => format!("{}/USD", base),
        _ => symbol.to_string(),
    }
}

/// Dollar price with precision chosen by magnitude.
pub fn format_price(price: f64) -> String {
    let abs = price.abs();
    if abs < 0.001 {
        format!("${:.8}", price)
    } else if abs < 1.0 {
        format!("${:.6}", price)
    } else if abs < 100.0 {
        format!("${:.4}", price)
    } else {
        let fixed = format!("{:.2}", abs);
        let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let sign = if price < 0.0 { "-" } else { "" };
        format!("{}${}.{}", sign, grouped, frac)
    }
}

pub fn render(frame: &mut Frame, state: &DashboardState) {
    let quote_rows = state.quotes.len().max(1) as u16 + 2;
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),          // status bar
            Constraint::Length(quote_rows), // quotes
            Constraint::Min(8),             // chart
            Constraint::Length(1),          // stats
            Constraint::Length(5),          // log
            Constraint::Length(1),          // keybinds
        ])
        .split(frame.area());

    frame.render_widget(
        StatusBar {
            feed_label: &state.feed_label,
            running: state.running,
            ws_status: state.ws_status.as_ref(),
            view: state.view,
            tick_count: state.tick_count,
            dropped_ticks: state.dropped_ticks,
        },
        outer[0],
    );

    let selected = state.selected_view();
    frame.render_widget(
        QuoteBar {
            quotes: &state.quotes,
            selected: selected.map(|v| v.symbol.as_str()),
        },
        outer[1],
    );

    let empty = SymbolView::default();
    let view = selected.unwrap_or(&empty);
    let label = if view.symbol.is_empty() {
        "-".to_string()
    } else {
        display_pair(&view.symbol)
    };
    match state.view {
        ChartView::Candles => frame.render_widget(
            CandleChart::new(&label, &view.candles)
                .current(view.current.as_ref())
                .sma(view.sma),
            outer[2],
        ),
        ChartView::Renko => frame.render_widget(
            RenkoChart::new(&label, view.brick_size, &view.bricks),
            outer[2],
        ),
        ChartView::PointFigure => frame.render_widget(
            PointFigureChart::new(&label, view.point_size, &view.points),
            outer[2],
        ),
        ChartView::Line => {
            frame.render_widget(PriceLineChart::new(&label, &view.prices), outer[2])
        }
    }

    frame.render_widget(StatsBar { stats: &state.stats }, outer[3]);
    frame.render_widget(LogPanel::new(state.log_messages.iter()), outer[4]);
    frame.render_widget(KeybindBar, outer[5]);
}
