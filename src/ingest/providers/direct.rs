// src/ingest/providers/direct.rs
//! Plain GET of the feed URL. Servers are not subject to browser CORS, so
//! this is a useful last resort when both proxies are down.

use async_trait::async_trait;

use crate::error::Result;
use crate::ingest::providers::allorigins::parse_xml_entries;
use crate::ingest::providers::{get_text, FetchStrategy};
use crate::ingest::types::{FeedSource, RawEntry};

const NAME: &str = "direct";

pub struct DirectStrategy {
    client: reqwest::Client,
}

impl DirectStrategy {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchStrategy for DirectStrategy {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        let body = get_text(NAME, self.client.get(&source.url)).await?;
        parse_xml_entries(NAME, &body)
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
