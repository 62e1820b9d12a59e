// src/ingest/providers/rss2json.rs
//! Feed-to-JSON converting proxy (`api.rss2json.com` shape).

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{IngestError, Result};
use crate::ingest::providers::{get_text, FetchStrategy};
use crate::ingest::types::{FeedSource, RawEntry};

const NAME: &str = "rss2json";

#[derive(Debug, Deserialize)]
struct Rss2JsonResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    items: Vec<Rss2JsonItem>,
}

/// One item of the proxy's JSON payload. `enclosure` is kept loose because
/// the proxy emits `{}` or `[]` when the feed has none.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rss2JsonItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub enclosure: serde_json::Value,
}

pub struct Rss2JsonStrategy {
    client: reqwest::Client,
    endpoint: String,
}

impl Rss2JsonStrategy {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    /// Decode a proxy payload. Only `status == "ok"` with items counts.
    pub fn parse_payload(body: &str) -> Result<Vec<RawEntry>> {
        let resp: Rss2JsonResponse =
            serde_json::from_str(body).map_err(|e| IngestError::parse(NAME, e))?;
        if resp.status != "ok" {
            let why = resp.message.unwrap_or_else(|| format!("status {:?}", resp.status));
            return Err(IngestError::fetch(NAME, why));
        }
        if resp.items.is_empty() {
            return Err(IngestError::fetch(NAME, "empty item list"));
        }
        Ok(resp.items.into_iter().map(RawEntry::Json).collect())
    }
}

#[async_trait]
impl FetchStrategy for Rss2JsonStrategy {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        let req = self
            .client
            .get(&self.endpoint)
            .query(&[("rss_url", source.url.as_str())]);
        let body = get_text(NAME, req).await?;
        Self::parse_payload(&body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
