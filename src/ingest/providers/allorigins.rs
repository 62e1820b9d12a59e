// src/ingest/providers/allorigins.rs
//! Raw-content passthrough proxy (`api.allorigins.win/get` shape): the
//! upstream document arrives as a string in `contents` and is parsed here.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{IngestError, Result};
use crate::ingest::providers::{get_text, FetchStrategy};
use crate::ingest::types::{FeedSource, RawEntry};
use crate::ingest::xml::parse_feed;

const NAME: &str = "allorigins";

#[derive(Debug, Deserialize)]
struct Passthrough {
    #[serde(default)]
    contents: Option<String>,
}

pub struct AllOriginsStrategy {
    client: reqwest::Client,
    endpoint: String,
}

impl AllOriginsStrategy {
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn parse_payload(body: &str) -> Result<Vec<RawEntry>> {
        let wrapper: Passthrough =
            serde_json::from_str(body).map_err(|e| IngestError::parse(NAME, e))?;
        let xml = wrapper
            .contents
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| IngestError::parse(NAME, "response missing contents"))?;
        parse_xml_entries(NAME, &xml)
    }
}

/// Shared by every strategy that receives the feed document itself.
pub(crate) fn parse_xml_entries(strategy: &'static str, xml: &str) -> Result<Vec<RawEntry>> {
    let items = parse_feed(xml).map_err(|e| IngestError::parse(strategy, e))?;
    if items.is_empty() {
        return Err(IngestError::fetch(strategy, "empty item list"));
    }
    Ok(items.into_iter().map(RawEntry::Xml).collect())
}

#[async_trait]
impl FetchStrategy for AllOriginsStrategy {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        let req = self
            .client
            .get(&self.endpoint)
            .query(&[("url", source.url.as_str())]);
        let body = get_text(NAME, req).await?;
        Self::parse_payload(&body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_rss_is_parsed() {
        let body = serde_json::json!({
            "contents": "<rss><channel><item><title>A</title><link>https://x/a</link></item></channel></rss>",
            "status": {"http_code": 200}
        })
        .to_string();
        let entries = AllOriginsStrategy::parse_payload(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0], RawEntry::Xml(_)));
    }

    #[test]
    fn missing_contents_is_parse_failure() {
        let err = AllOriginsStrategy::parse_payload(r#"{"status":{}}"#).unwrap_err();
        assert!(matches!(err, IngestError::Parse { .. }));
    }
}
