// src/ingest/providers/fixture.rs
//! In-process strategy serving canned feed documents keyed by feed URL.
//! Used for offline runs and tests; unknown URLs fail like a dead host.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::ingest::providers::allorigins::parse_xml_entries;
use crate::ingest::providers::FetchStrategy;
use crate::ingest::types::{FeedSource, RawEntry};

pub struct FixtureStrategy {
    name: &'static str,
    feeds: HashMap<String, String>,
    fail_with: Option<String>,
}

impl FixtureStrategy {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            feeds: HashMap::new(),
            fail_with: None,
        }
    }

    /// A strategy whose every fetch fails with `reason`.
    pub fn failing(name: &'static str, reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            ..Self::new(name)
        }
    }

    pub fn with_feed(mut self, url: &str, xml: &str) -> Self {
        self.feeds.insert(url.to_string(), xml.to_string());
        self
    }
}

#[async_trait]
impl FetchStrategy for FixtureStrategy {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>> {
        if let Some(reason) = &self.fail_with {
            return Err(IngestError::fetch(self.name, reason));
        }
        let xml = self
            .feeds
            .get(&source.url)
            .ok_or_else(|| IngestError::fetch(self.name, format!("no fixture for {}", source.url)))?;
        parse_xml_entries(self.name, xml)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
