use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::engine::{DashboardStats, QuoteSummary};
use crate::event::WsConnectionStatus;

use super::{display_pair, format_price, ChartView};

fn change_color(val: f64) -> Color {
    if val > 0.0 {
        Color::Green
    } else if val < 0.0 {
        Color::Red
    } else {
        Color::White
    }
}

pub struct StatusBar<'a> {
    pub feed_label: &'a str,
    pub running: bool,
    pub ws_status: Option<&'a WsConnectionStatus>,
    pub view: ChartView,
    pub tick_count: u64,
    pub dropped_ticks: u64,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let run_status = if self.running {
            Span::styled(" RUNNING ", Style::default().fg(Color::Green))
        } else {
            Span::styled(
                " STOPPED ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )
        };

        let mut spans = vec![
            Span::styled(
                " candlewick ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("| ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.feed_label, Style::default().fg(Color::Cyan)),
            Span::styled(" | ", Style::default().fg(Color::DarkGray)),
            run_status,
        ];

        if let Some(status) = self.ws_status {
            let ws = match status {
                WsConnectionStatus::Connected => {
                    Span::styled("CONNECTED", Style::default().fg(Color::Green))
                }
                WsConnectionStatus::Disconnected => {
                    Span::styled("DISCONNECTED", Style::default().fg(Color::Red))
                }
                WsConnectionStatus::Reconnecting { attempt, delay_ms } => Span::styled(
                    format!("RECONNECTING #{} in {}ms", attempt, delay_ms),
                    Style::default().fg(Color::Yellow),
                ),
            };
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
            spans.push(ws);
        }

        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            self.view.label(),
            Style::default().fg(Color::Magenta),
        ));
        spans.push(Span::styled(
            format!(" | ticks: {}", self.tick_count),
            Style::default().fg(Color::DarkGray),
        ));
        if self.dropped_ticks > 0 {
            spans.push(Span::styled(
                format!(" dropped: {}", self.dropped_ticks),
                Style::default().fg(Color::Red),
            ));
        }

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

/// One line per tracked symbol with price and candle/session change.
pub struct QuoteBar<'a> {
    pub quotes: &'a [QuoteSummary],
    pub selected: Option<&'a str>,
}

impl Widget for QuoteBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines: Vec<Line> = if self.quotes.is_empty() {
            vec![Line::from(Span::styled(
                "No quotes yet",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.quotes
                .iter()
                .map(|q| {
                    let marker = if q.candle_change_pct >= 0.0 { "▲" } else { "▼" };
                    let name_style = if self.selected == Some(q.symbol.as_str()) {
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    Line::from(vec![
                        Span::styled(
                            format!("{} ", marker),
                            Style::default().fg(change_color(q.candle_change_pct)),
                        ),
                        Span::styled(format!("{:<10}", display_pair(&q.symbol)), name_style),
                        Span::styled(
                            format!(" {:>14}", format_price(q.price)),
                            Style::default().fg(Color::White),
                        ),
                        Span::styled(
                            format!("  {:+.2}% session", q.session_change_pct),
                            Style::default().fg(change_color(q.session_change_pct)),
                        ),
                        Span::styled(
                            format!("  {:+.3}% candle", q.candle_change_pct),
                            Style::default().fg(change_color(q.candle_change_pct)),
                        ),
                        Span::styled(
                            format!(
                                "  H {} L {}",
                                format_price(q.high),
                                format_price(q.low)
                            ),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ])
                })
                .collect()
        };

        let block = Block::default()
            .title(" Quotes ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct StatsBar<'a> {
    pub stats: &'a DashboardStats,
}

impl Widget for StatsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let s = self.stats;
        let trend = match s.avg_candle_change_pct {
            Some(v) => Span::styled(format!("{:+.3}%", v), Style::default().fg(change_color(v))),
            None => Span::styled("---", Style::default().fg(Color::DarkGray)),
        };
        let line = Line::from(vec![
            Span::styled(" Active candles: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}/{}", s.active_candles, s.total_symbols),
                Style::default().fg(Color::White),
            ),
            Span::styled("  Trend: ", Style::default().fg(Color::DarkGray)),
            trend,
            Span::styled("  Closed candles: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{}", s.total_candles), Style::default().fg(Color::White)),
            Span::styled("  Volume: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:.0}", s.total_volume), Style::default().fg(Color::White)),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

pub struct LogPanel<'a> {
    messages: Vec<&'a str>,
}

impl<'a> LogPanel<'a> {
    pub fn new<I: IntoIterator<Item = &'a String>>(messages: I) -> Self {
        Self {
            messages: messages.into_iter().map(String::as_str).collect(),
        }
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let rows = block.inner(area).height as usize;
        let start = self.messages.len().saturating_sub(rows);
        let lines: Vec<Line> = self.messages[start..]
            .iter()
            .map(|m| Line::from(Span::styled(*m, Style::default().fg(Color::Gray))))
            .collect();
        Paragraph::new(lines).block(block).render(area, buf);
    }
}

pub struct KeybindBar;

impl Widget for KeybindBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key = Style::default().fg(Color::Yellow);
        let text = Style::default().fg(Color::DarkGray);
        let line = Line::from(vec![
            Span::styled(" [Q]", key),
            Span::styled("uit  ", text),
            Span::styled("[S]", key),
            Span::styled("tart/stop  ", text),
            Span::styled("[V]", key),
            Span::styled("iew  ", text),
            Span::styled("[←/→]", key),
            Span::styled(" symbol  ", text),
            Span::styled("[R]", key),
            Span::styled("eset symbol  ", text),
            Span::styled("[X]", key),
            Span::styled(" reset all", text),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
