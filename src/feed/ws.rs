use anyhow::{Context, Result};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite;

use super::types::{BinanceTickerEvent, CombinedStreamMessage, TickerVolumeTracker};
use crate::error::AppError;
use crate::event::{AppEvent, WsConnectionStatus};
use crate::model::tick::Tick;

/// Exponential backoff for reconnection.
#[derive(Debug)]
pub struct ExponentialBackoff {
    current: Duration,
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            current: initial,
            initial,
            max,
            factor,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = Duration::from_secs_f64(
            (self.current.as_secs_f64() * self.factor).min(self.max.as_secs_f64()),
        );
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Combined `<symbol>@ticker` stream for all tracked symbols.
#[derive(Debug, Clone)]
pub struct BinanceTickerStream {
    url: String,
}

impl BinanceTickerStream {
    pub fn new(ws_base_url: &str, symbols: &[String]) -> Self {
        Self {
            url: stream_url(ws_base_url, symbols),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and run the WebSocket loop with automatic reconnection.
    /// Ticks go to `tick_tx`; connection status and log lines to `status_tx`.
    pub async fn connect_and_run(
        &self,
        tick_tx: mpsc::Sender<Tick>,
        status_tx: mpsc::Sender<AppEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 2.0);
        let mut attempt: u32 = 0;
        // Outlives reconnects so a replayed last trade is not counted twice.
        let mut volumes = TickerVolumeTracker::new();

        loop {
            attempt += 1;
            match self
                .connect_once(&tick_tx, &status_tx, &mut shutdown, &mut backoff, &mut volumes)
                .await
            {
                Ok(()) => {
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Ticker stream dropped");
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Disconnected))
                        .await;
                    let _ = status_tx
                        .send(AppEvent::LogMessage(format!("WS error: {}", e)))
                        .await;

                    let delay = backoff.next_delay();
                    let _ = status_tx
                        .send(AppEvent::WsStatus(WsConnectionStatus::Reconnecting {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        }))
                        .await;

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = shutdown.changed() => {
                            tracing::info!("Shutdown during reconnect");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn connect_once(
        &self,
        tick_tx: &mpsc::Sender<Tick>,
        status_tx: &mpsc::Sender<AppEvent>,
        shutdown: &mut watch::Receiver<bool>,
        backoff: &mut ExponentialBackoff,
        volumes: &mut TickerVolumeTracker,
    ) -> Result<()> {
        tracing::info!(url = %self.url, "Connecting ticker stream");

        let (ws_stream, _resp) = tokio_tungstenite::connect_async(&self.url)
            .await
            .context("WebSocket connect failed")?;

        backoff.reset();
        let _ = status_tx
            .send(AppEvent::WsStatus(WsConnectionStatus::Connected))
            .await;

        let (_write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            match parse_ticker_message(&text) {
                                Ok(event) => {
                                    let _ = status_tx.try_send(AppEvent::Market(event.to_snapshot()));
                                    if tick_tx.try_send(volumes.tick(&event)).is_err() {
                                        tracing::warn!("Tick queue full, dropping tick");
                                        let _ = status_tx.try_send(AppEvent::TickDropped);
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(error = %e, "Failed to parse WS message");
                                }
                            }
                        }
                        Some(Ok(tungstenite::Message::Close(_))) => {
                            return Err(AppError::WebSocket("closed by server".to_string()).into());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(AppError::WebSocket(format!("read error: {}", e)).into());
                        }
                        None => {
                            return Err(AppError::WebSocket("stream ended".to_string()).into());
                        }
                    }
                }
                _ = shutdown.changed() => {
                    return Ok(());
                }
            }
        }
    }
}

pub fn stream_url(ws_base_url: &str, symbols: &[String]) -> String {
    let streams: Vec<String> = symbols
        .iter()
        .map(|s| format!("{}@ticker", s.to_ascii_lowercase()))
        .collect();
    format!(
        "{}/stream?streams={}",
        ws_base_url.trim_end_matches('/'),
        streams.join("/")
    )
}

pub fn parse_ticker_message(text: &str) -> Result<BinanceTickerEvent> {
    let msg: CombinedStreamMessage<BinanceTickerEvent> =
        serde_json::from_str(text).context("not a combined ticker message")?;
    Ok(msg.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(b.next_delay(), Duration::from_secs(1));
        assert_eq!(b.next_delay(), Duration::from_secs(2));
        assert_eq!(b.next_delay(), Duration::from_secs(4));
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        assert_eq!(b.next_delay(), Duration::from_secs(5));
        b.reset();
        assert_eq!(b.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn builds_combined_stream_url() {
        let url = stream_url(
            "wss://stream.binance.com:9443/",
            &["BTCUSDT".to_string(), "EthUsdt".to_string()],
        );
        assert_eq!(
            url,
            "wss://stream.binance.com:9443/stream?streams=btcusdt@ticker/ethusdt@ticker"
        );
    }

    #[test]
    fn rejects_non_ticker_payload() {
        assert!(parse_ticker_message(r#"{"result":null,"id":1}"#).is_err());
    }
}
