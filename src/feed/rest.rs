use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::types::{coingecko_id, BinanceTicker24h, CoinGeckoSimplePrice};
use super::{PriceProvider, ProviderResult};
use crate::error::AppError;
use crate::simulator::MarketSnapshot;

fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

async fn read_success(resp: reqwest::Response, provider: &str) -> Result<String> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        return Err(AppError::Provider {
            provider: provider.to_string(),
            msg: format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
        }
        .into());
    }
    Ok(body)
}

pub struct CoinGeckoProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<MarketSnapshot>> {
        let ids: Vec<&str> = symbols.iter().filter_map(|s| coingecko_id(s)).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/api/v3/simple/price", self.base_url);
        let mut req = self.http.get(&url).query(&[
            ("ids", ids.join(",").as_str()),
            ("vs_currencies", "usd"),
            ("include_24hr_change", "true"),
            ("include_24hr_vol", "true"),
        ]);
        if let Some(key) = &self.api_key {
            req = req.header("x-cg-demo-api-key", key);
        }

        let resp = req.send().await.context("coingecko HTTP failed")?;
        let body = read_success(resp, "coingecko").await?;
        let data: CoinGeckoSimplePrice =
            serde_json::from_str(&body).context("coingecko response is not valid JSON")?;
        Ok(snapshots_from_coingecko(symbols, &data))
    }
}

/// Map a CoinGecko response back onto the requested USDT symbols.
pub fn snapshots_from_coingecko(
    symbols: &[String],
    data: &CoinGeckoSimplePrice,
) -> Vec<MarketSnapshot> {
    symbols
        .iter()
        .filter_map(|symbol| {
            let quote = data.get(coingecko_id(symbol)?)?;
            Some(MarketSnapshot {
                symbol: symbol.clone(),
                price: quote.usd,
                change_24h_pct: quote.usd_24h_change.unwrap_or(0.0),
                volume_24h: quote.usd_24h_vol.unwrap_or(0.0),
            })
        })
        .filter(|s| s.price > 0.0)
        .collect()
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self, symbols: &[String]) -> ProviderResult {
        match self.fetch_quotes(symbols).await {
            Ok(quotes) => ProviderResult::Available(quotes),
            Err(e) => ProviderResult::Unavailable(format!("{:#}", e)),
        }
    }
}

pub struct BinanceTickerProvider {
    http: reqwest::Client,
    base_url: String,
}

impl BinanceTickerProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<MarketSnapshot>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let symbols_param = serde_json::to_string(symbols)?;
        let resp = self
            .http
            .get(&url)
            .query(&[("symbols", symbols_param.as_str())])
            .send()
            .await
            .context("binance ticker HTTP failed")?;
        let body = read_success(resp, "binance").await?;
        let items: Vec<BinanceTicker24h> =
            serde_json::from_str(&body).context("binance ticker response is not valid JSON")?;
        Ok(items
            .into_iter()
            .map(MarketSnapshot::from)
            .filter(|s| s.price > 0.0)
            .collect())
    }
}

#[async_trait]
impl PriceProvider for BinanceTickerProvider {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch(&self, symbols: &[String]) -> ProviderResult {
        match self.fetch_quotes(symbols).await {
            Ok(quotes) => ProviderResult::Available(quotes),
            Err(e) => ProviderResult::Unavailable(format!("{:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coingecko_snapshots_follow_requested_order() {
        let body = r#"{
            "ethereum": {"usd": 2300.0, "usd_24h_change": -1.5, "usd_24h_vol": 9000000.0},
            "bitcoin": {"usd": 43000.0}
        }"#;
        let data: CoinGeckoSimplePrice = serde_json::from_str(body).unwrap();
        let symbols = vec![
            "BTCUSDT".to_string(),
            "ETHUSDT".to_string(),
            "PEPEUSDT".to_string(),
        ];
        let snaps = snapshots_from_coingecko(&symbols, &data);
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].symbol, "BTCUSDT");
        assert_eq!(snaps[0].change_24h_pct, 0.0);
        assert_eq!(snaps[1].symbol, "ETHUSDT");
        assert!((snaps[1].volume_24h - 9_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unreachable_host_is_unavailable() {
        let provider = BinanceTickerProvider::new("http://127.0.0.1:1", Duration::from_millis(200));
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let result = rt.block_on(provider.fetch(&["BTCUSDT".to_string()]));
        assert!(matches!(result, ProviderResult::Unavailable(_)));
    }
}
