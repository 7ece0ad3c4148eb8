use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::engine::{BoxSizes, ChartSettings, MAX_TRACKED_SYMBOLS};
use crate::model::candle::VolumePolicy;
use crate::simulator::SimulatorParams;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    pub chart: ChartConfig,
    #[serde(default)]
    pub simulator: SimulatorParams,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Poll reference quotes and synthesize ticks between polls.
    Simulated,
    /// Stream ticker updates over WebSocket.
    Live,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub mode: FeedMode,
    pub symbols: Vec<String>,
    /// Provider names in fallback order.
    pub providers: Vec<String>,
    pub coingecko_base_url: String,
    pub binance_rest_base_url: String,
    pub binance_ws_base_url: String,
    pub refresh_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(skip)]
    pub coingecko_api_key: Option<String>,
}

fn default_http_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    pub candle_interval: String,
    pub brick_size: f64,
    pub point_size: f64,
    pub history_len: usize,
    pub price_history_len: usize,
    #[serde(default)]
    pub volume_policy: VolumePolicy,
    pub sma_period: usize,
    #[serde(default)]
    pub symbol_overrides: Vec<SymbolOverride>,
}

/// Per-symbol box sizes; symbols trade at very different price scales.
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolOverride {
    pub symbol: String,
    pub brick_size: f64,
    pub point_size: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_file() -> String {
    "candlewick.log".to_string()
}

/// Parse an interval string (e.g. "10s", "1m", "1h", "1d") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    if s.len() < 2 {
        bail!("invalid interval '{}': expected format like '10s'", s);
    }

    let (num_str, suffix) = s.split_at(s.len() - 1);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl FeedConfig {
    /// Uppercased, de-duplicated symbols, capped at the dashboard limit.
    pub fn tracked_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in &self.symbols {
            let s = sym.trim().to_ascii_uppercase();
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        if out.len() > MAX_TRACKED_SYMBOLS {
            tracing::warn!(
                requested = out.len(),
                max = MAX_TRACKED_SYMBOLS,
                "Too many symbols configured, extra symbols ignored"
            );
            out.truncate(MAX_TRACKED_SYMBOLS);
        }
        out
    }
}

impl ChartConfig {
    pub fn settings(&self) -> Result<ChartSettings> {
        let candle_interval_ms = parse_interval_ms(&self.candle_interval)
            .context("chart.candle_interval is invalid")?;
        Ok(ChartSettings {
            candle_interval_ms,
            brick_size: self.brick_size,
            point_size: self.point_size,
            history_len: self.history_len,
            price_history_len: self.price_history_len,
            volume_policy: self.volume_policy,
            sma_period: self.sma_period,
        })
    }

    pub fn box_overrides(&self) -> Vec<(String, BoxSizes)> {
        self.symbol_overrides
            .iter()
            .map(|o| {
                (
                    o.symbol.trim().to_ascii_uppercase(),
                    BoxSizes {
                        brick_size: o.brick_size,
                        point_size: o.point_size,
                    },
                )
            })
            .collect()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        config.feed.coingecko_api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.chart.settings()?.validate()?;
        for (symbol, sizes) in self.chart.box_overrides() {
            sizes
                .validate()
                .with_context(|| format!("chart.symbol_overrides for {} is invalid", symbol))?;
        }
        if self.feed.tracked_symbols().is_empty() {
            bail!("feed.symbols must name at least one symbol");
        }
        if self.feed.mode == FeedMode::Simulated && self.feed.providers.is_empty() {
            bail!("feed.providers must not be empty in simulated mode");
        }
        if self.feed.refresh_secs == 0 {
            bail!("feed.refresh_secs must be > 0");
        }
        if self.ui.refresh_rate_ms == 0 {
            bail!("ui.refresh_rate_ms must be > 0");
        }
        Ok(())
    }
}
