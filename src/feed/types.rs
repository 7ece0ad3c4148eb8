use std::collections::HashMap;

use serde::Deserialize;

use crate::model::tick::Tick;
use crate::simulator::MarketSnapshot;

/// Deserialize Binance string-encoded numbers to f64.
pub fn string_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

/// Combined-stream envelope (`/stream?streams=a/b`).
#[derive(Debug, Deserialize)]
pub struct CombinedStreamMessage<T> {
    pub stream: String,
    pub data: T,
}

/// Binance 24h rolling ticker stream event (symbol@ticker).
#[derive(Debug, Deserialize)]
pub struct BinanceTickerEvent {
    #[serde(rename = "e")]
    pub event_type: String,
    #[serde(rename = "E")]
    pub event_time: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c", deserialize_with = "string_to_f64")]
    pub last_price: f64,
    #[serde(rename = "Q", deserialize_with = "string_to_f64")]
    pub last_qty: f64,
    #[serde(rename = "P", deserialize_with = "string_to_f64")]
    pub price_change_pct: f64,
    #[serde(rename = "q", deserialize_with = "string_to_f64")]
    pub quote_volume: f64,
    /// Id of the trade behind `c`/`Q`. Unchanged across events when no
    /// trade happened in between.
    #[serde(rename = "L", default)]
    pub last_trade_id: i64,
}

impl BinanceTickerEvent {
    pub fn to_tick(&self) -> Tick {
        Tick::new(
            self.symbol.to_ascii_uppercase(),
            self.last_price,
            self.last_qty,
            self.event_time,
        )
    }

    pub fn to_snapshot(&self) -> MarketSnapshot {
        MarketSnapshot {
            symbol: self.symbol.to_ascii_uppercase(),
            price: self.last_price,
            change_24h_pct: self.price_change_pct,
            volume_24h: self.quote_volume,
        }
    }
}

/// Turns ticker events into ticks without re-counting a trade's quantity.
///
/// The ticker stream repeats `Q` on every push even when no trade has
/// printed since the previous event; such events become zero-volume ticks.
#[derive(Debug, Default)]
pub struct TickerVolumeTracker {
    last_trade: HashMap<String, i64>,
}

impl TickerVolumeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, event: &BinanceTickerEvent) -> Tick {
        let mut tick = event.to_tick();
        let previous = self
            .last_trade
            .insert(tick.symbol.clone(), event.last_trade_id);
        if previous.is_some_and(|id| id >= event.last_trade_id) {
            tick.volume = 0.0;
        }
        tick
    }
}

/// Binance REST 24h ticker item (GET /api/v3/ticker/24hr).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceTicker24h {
    pub symbol: String,
    #[serde(deserialize_with = "string_to_f64")]
    pub last_price: f64,
    #[serde(deserialize_with = "string_to_f64")]
    pub price_change_percent: f64,
    #[serde(deserialize_with = "string_to_f64")]
    pub quote_volume: f64,
}

impl From<BinanceTicker24h> for MarketSnapshot {
    fn from(t: BinanceTicker24h) -> Self {
        MarketSnapshot {
            symbol: t.symbol.to_ascii_uppercase(),
            price: t.last_price,
            change_24h_pct: t.price_change_percent,
            volume_24h: t.quote_volume,
        }
    }
}

/// CoinGecko `/simple/price` entry for one coin id.
#[derive(Debug, Deserialize)]
pub struct CoinGeckoQuote {
    pub usd: f64,
    #[serde(default)]
    pub usd_24h_change: Option<f64>,
    #[serde(default)]
    pub usd_24h_vol: Option<f64>,
}

pub type CoinGeckoSimplePrice = HashMap<String, CoinGeckoQuote>;

/// USDT pair to CoinGecko coin id.
pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    let id = match symbol {
        "BTCUSDT" => "bitcoin",
        "ETHUSDT" => "ethereum",
        "BNBUSDT" => "binancecoin",
        "ADAUSDT" => "cardano",
        "XRPUSDT" => "ripple",
        "SOLUSDT" => "solana",
        "DOTUSDT" => "polkadot",
        "DOGEUSDT" => "dogecoin",
        "AVAXUSDT" => "avalanche-2",
        "LINKUSDT" => "chainlink",
        "MATICUSDT" => "matic-network",
        "LTCUSDT" => "litecoin",
        "UNIUSDT" => "uniswap",
        "ATOMUSDT" => "cosmos",
        "FILUSDT" => "filecoin",
        _ => return None,
    };
    Some(id)
}
