//! Price sources feeding the chart engine.
//!
//! Providers are polled in order until one returns data; the WebSocket
//! stream pushes ticks into a queue drained by the UI loop. Nothing here
//! touches aggregation state directly.

pub mod rest;
pub mod types;
pub mod ws;

use async_trait::async_trait;

use crate::simulator::MarketSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult {
    Available(Vec<MarketSnapshot>),
    Unavailable(String),
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch reference quotes. Failures are reported as `Unavailable`.
    async fn fetch(&self, symbols: &[String]) -> ProviderResult;
}

/// Ordered fallback list of providers.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: Box<dyn PriceProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First non-empty `Available` wins; otherwise the reasons are joined.
    pub async fn fetch(&self, symbols: &[String]) -> ProviderResult {
        let mut reasons = Vec::new();
        for provider in &self.providers {
            match provider.fetch(symbols).await {
                ProviderResult::Available(quotes) if !quotes.is_empty() => {
                    tracing::debug!(
                        provider = provider.name(),
                        count = quotes.len(),
                        "Reference quotes fetched"
                    );
                    return ProviderResult::Available(quotes);
                }
                ProviderResult::Available(_) => {
                    reasons.push(format!("{}: no quotes", provider.name()));
                }
                ProviderResult::Unavailable(reason) => {
                    tracing::warn!(provider = provider.name(), reason = %reason, "Provider unavailable");
                    reasons.push(format!("{}: {}", provider.name(), reason));
                }
            }
        }
        if reasons.is_empty() {
            reasons.push("no providers configured".to_string());
        }
        ProviderResult::Unavailable(reasons.join("; "))
    }
}
