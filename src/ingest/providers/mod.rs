// src/ingest/providers/mod.rs
//! Feed fetch strategies and the ordered fallback chain that tries them.

pub mod allorigins;
pub mod direct;
pub mod fixture;
pub mod rss2json;

use async_trait::async_trait;
use metrics::counter;
use std::time::Duration;

use crate::error::{IngestError, Result};
use crate::ingest::config::IngestConfig;
use crate::ingest::types::{FeedSource, RawEntry};

/// One way of turning a feed URL into raw entries. An `Ok` must carry at
/// least one entry; an empty item list is a failure so the chain moves on.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>>;
    fn name(&self) -> &'static str;
}

/// Strategies tried in order until one yields entries.
pub struct FetchChain {
    strategies: Vec<Box<dyn FetchStrategy>>,
}

impl FetchChain {
    pub fn new(strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the chain named by `cfg.strategies`, sharing one HTTP client.
    pub fn from_config(cfg: &IngestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
            .user_agent(concat!("news-sentiment-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Config(format!("http client: {e}")))?;

        let mut strategies: Vec<Box<dyn FetchStrategy>> = Vec::with_capacity(cfg.strategies.len());
        for name in &cfg.strategies {
            let s: Box<dyn FetchStrategy> = match name.trim().to_ascii_lowercase().as_str() {
                "rss2json" => Box::new(rss2json::Rss2JsonStrategy::new(
                    client.clone(),
                    &cfg.rss2json_endpoint,
                )),
                "allorigins" => Box::new(allorigins::AllOriginsStrategy::new(
                    client.clone(),
                    &cfg.allorigins_endpoint,
                )),
                "direct" => Box::new(direct::DirectStrategy::new(client.clone())),
                other => {
                    return Err(IngestError::Config(format!("unknown fetch strategy: {other}")))
                }
            };
            strategies.push(s);
        }
        if strategies.is_empty() {
            return Err(IngestError::Config("no fetch strategies configured".into()));
        }
        Ok(Self::new(strategies))
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Try each strategy in order. Returns the winning strategy's name with
    /// its entries, or `Exhausted` listing every attempt's failure.
    pub async fn fetch(&self, source: &FeedSource) -> Result<(&'static str, Vec<RawEntry>)> {
        let mut attempts = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            match strategy.fetch(source).await {
                Ok(entries) if !entries.is_empty() => {
                    tracing::debug!(
                        source = %source.name,
                        strategy = strategy.name(),
                        entries = entries.len(),
                        "fetch ok"
                    );
                    return Ok((strategy.name(), entries));
                }
                Ok(_) => {
                    let e = IngestError::fetch(strategy.name(), "empty item list");
                    tracing::info!(source = %source.name, error = %e, "strategy fell through");
                    counter!("ingest_strategy_failures_total").increment(1);
                    attempts.push(e.to_string());
                }
                Err(e) => {
                    tracing::info!(source = %source.name, error = %e, "strategy fell through");
                    counter!("ingest_strategy_failures_total").increment(1);
                    attempts.push(e.to_string());
                }
            }
        }
        Err(IngestError::Exhausted {
            source_name: source.name.clone(),
            attempts,
        })
    }
}

/// GET `req`, requiring a 2xx status, and return the body text.
pub(crate) async fn get_text(strategy: &'static str, req: reqwest::RequestBuilder) -> Result<String> {
    let resp = req
        .send()
        .await
        .map_err(|e| IngestError::fetch(strategy, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(IngestError::fetch(strategy, format!("HTTP {status}")));
    }
    resp.text().await.map_err(|e| IngestError::fetch(strategy, e))
}
