use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Widget},
};

use crate::model::brick::{BrickDirection, RenkoBrick};
use crate::model::candle::Candle;
use crate::model::point::{Marker, PnfPoint};
use crate::model::tick::PricePoint;

use super::format_price;

/// Maps prices onto terminal rows (row 0 is the top).
#[derive(Debug, Clone, Copy)]
struct PriceScale {
    min: f64,
    max: f64,
    rows: usize,
}

impl PriceScale {
    fn fit<I: IntoIterator<Item = f64>>(values: I, rows: usize) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values.into_iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
        }
        if rows == 0 || !min.is_finite() || !max.is_finite() {
            return None;
        }
        Some(Self { min, max, rows })
    }

    fn row(&self, price: f64) -> usize {
        let range = self.max - self.min;
        if range <= 0.0 {
            return self.rows / 2;
        }
        let normalized = ((price - self.min) / range).clamp(0.0, 1.0);
        let from_bottom = (normalized * (self.rows - 1) as f64).round() as usize;
        self.rows - 1 - from_bottom.min(self.rows - 1)
    }

    fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

fn chart_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
}

fn draw_placeholder(inner: Rect, buf: &mut Buffer, text: &str) {
    if inner.height == 0 || inner.width == 0 {
        return;
    }
    let y = inner.y + inner.height / 2;
    let x = inner.x + inner.width.saturating_sub(text.chars().count() as u16) / 2;
    buf.set_string(x, y, text, Style::default().fg(Color::DarkGray));
}

fn draw_axis_labels(inner: Rect, buf: &mut Buffer, scale: &PriceScale) {
    let style = Style::default().fg(Color::DarkGray);
    buf.set_string(inner.x, inner.y, format_price(scale.max), style);
    buf.set_string(
        inner.x,
        inner.y + inner.height - 1,
        format_price(scale.min),
        style,
    );
}

fn draw_column(buf: &mut Buffer, x: u16, top: u16, from: usize, to: usize, symbol: &str, style: Style) {
    for row in from.min(to)..=from.max(to) {
        buf.set_string(x, top + row as u16, symbol, style);
    }
}

/// OHLC candles, one column per candle, with the in-progress candle last.
pub struct CandleChart<'a> {
    title: String,
    candles: &'a [Candle],
    current: Option<&'a Candle>,
    sma: Option<f64>,
}

impl<'a> CandleChart<'a> {
    pub fn new(symbol: &str, candles: &'a [Candle]) -> Self {
        Self {
            title: format!(" {} Candles ", symbol),
            candles,
            current: None,
            sma: None,
        }
    }

    pub fn current(mut self, candle: Option<&'a Candle>) -> Self {
        self.current = candle;
        self
    }

    pub fn sma(mut self, val: Option<f64>) -> Self {
        self.sma = val;
        self
    }
}

impl Widget for CandleChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = chart_block(&self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        let all: Vec<(&Candle, bool)> = self
            .candles
            .iter()
            .map(|c| (c, false))
            .chain(self.current.map(|c| (c, true)))
            .collect();
        if all.is_empty() {
            draw_placeholder(inner, buf, "Forming candles...");
            return;
        }
        if inner.height < 2 || inner.width < 4 {
            return;
        }

        let width = inner.width as usize;
        let visible = &all[all.len().saturating_sub(width)..];
        let Some(scale) = PriceScale::fit(
            visible.iter().flat_map(|(c, _)| [c.high, c.low]),
            inner.height as usize,
        ) else {
            return;
        };

        for (i, (candle, in_progress)) in visible.iter().enumerate() {
            let x = inner.x + i as u16;
            let mut color = if candle.is_bullish() {
                Color::Green
            } else {
                Color::Red
            };
            if *in_progress {
                color = if candle.is_bullish() {
                    Color::LightGreen
                } else {
                    Color::LightRed
                };
            }
            let style = Style::default().fg(color);
            draw_column(buf, x, inner.y, scale.row(candle.high), scale.row(candle.low), "│", style);
            draw_column(buf, x, inner.y, scale.row(candle.open), scale.row(candle.close), "█", style);
        }

        if let Some(sma) = self.sma.filter(|v| scale.contains(*v)) {
            let last_x = inner.x + visible.len() as u16 - 1;
            buf.set_string(
                last_x,
                inner.y + scale.row(sma) as u16,
                "S",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            );
        }

        draw_axis_labels(inner, buf, &scale);
    }
}

/// Renko bricks, one column per brick.
pub struct RenkoChart<'a> {
    title: String,
    bricks: &'a [RenkoBrick],
}

impl<'a> RenkoChart<'a> {
    pub fn new(symbol: &str, brick_size: f64, bricks: &'a [RenkoBrick]) -> Self {
        Self {
            title: format!(" {} Renko ({}) ", symbol, format_price(brick_size)),
            bricks,
        }
    }
}

impl Widget for RenkoChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = chart_block(&self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.bricks.is_empty() {
            draw_placeholder(inner, buf, "Waiting for a full brick...");
            return;
        }
        if inner.height < 2 || inner.width < 4 {
            return;
        }

        let width = inner.width as usize;
        let visible = &self.bricks[self.bricks.len().saturating_sub(width)..];
        let Some(scale) = PriceScale::fit(
            visible.iter().flat_map(|b| [b.high, b.low]),
            inner.height as usize,
        ) else {
            return;
        };

        for (i, brick) in visible.iter().enumerate() {
            let color = match brick.direction {
                BrickDirection::Up => Color::Green,
                BrickDirection::Down => Color::Red,
                BrickDirection::Neutral => Color::Gray,
            };
            draw_column(
                buf,
                inner.x + i as u16,
                inner.y,
                scale.row(brick.high),
                scale.row(brick.low),
                "█",
                Style::default().fg(color),
            );
        }

        draw_axis_labels(inner, buf, &scale);
    }
}

/// Point-and-Figure columns, two cells per column.
pub struct PointFigureChart<'a> {
    title: String,
    points: &'a [PnfPoint],
}

impl<'a> PointFigureChart<'a> {
    pub fn new(symbol: &str, point_size: f64, points: &'a [PnfPoint]) -> Self {
        Self {
            title: format!(" {} Point & Figure ({}) ", symbol, format_price(point_size)),
            points,
        }
    }
}

impl Widget for PointFigureChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = chart_block(&self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            draw_placeholder(inner, buf, "Waiting for price...");
            return;
        };
        if inner.height < 2 || inner.width < 4 {
            return;
        }

        let max_columns = (inner.width as u32 / 2).max(1);
        let first_col = last.column.saturating_sub(max_columns - 1).max(first.column);
        let visible: Vec<&PnfPoint> = self
            .points
            .iter()
            .filter(|p| p.column >= first_col)
            .collect();
        let Some(scale) =
            PriceScale::fit(visible.iter().map(|p| p.price_level), inner.height as usize)
        else {
            return;
        };

        for p in visible {
            let x = inner.x + ((p.column - first_col) * 2) as u16;
            let color = match p.marker {
                Marker::X => Color::Green,
                Marker::O => Color::Red,
            };
            buf.set_string(
                x,
                inner.y + scale.row(p.price_level) as u16,
                p.marker.symbol(),
                Style::default().fg(color),
            );
        }

        draw_axis_labels(inner, buf, &scale);
    }
}

/// Raw tick prices as a dotted line.
pub struct PriceLineChart<'a> {
    title: String,
    prices: &'a [PricePoint],
}

impl<'a> PriceLineChart<'a> {
    pub fn new(symbol: &str, prices: &'a [PricePoint]) -> Self {
        Self {
            title: format!(" {} Price ", symbol),
            prices,
        }
    }
}

impl Widget for PriceLineChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = chart_block(&self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.prices.is_empty() {
            draw_placeholder(inner, buf, "Waiting for price...");
            return;
        }
        if inner.height < 2 || inner.width < 4 {
            return;
        }

        let width = inner.width as usize;
        let visible = &self.prices[self.prices.len().saturating_sub(width)..];
        let Some(scale) = PriceScale::fit(visible.iter().map(|p| p.price), inner.height as usize)
        else {
            return;
        };

        for (i, p) in visible.iter().enumerate() {
            buf.set_string(
                inner.x + i as u16,
                inner.y + scale.row(p.price) as u16,
                "•",
                Style::default().fg(Color::Cyan),
            );
        }

        draw_axis_labels(inner, buf, &scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_maps_extremes_to_edges() {
        let scale = PriceScale::fit([10.0, 20.0], 11).unwrap();
        assert_eq!(scale.row(20.0), 0);
        assert_eq!(scale.row(10.0), 10);
        assert_eq!(scale.row(15.0), 5);
        assert_eq!(scale.row(99.0), 0);
    }

    #[test]
    fn flat_scale_uses_middle_row() {
        let scale = PriceScale::fit([5.0, 5.0], 8).unwrap();
        assert_eq!(scale.row(5.0), 4);
        assert!(PriceScale::fit(Vec::<f64>::new(), 8).is_none());
    }
}
