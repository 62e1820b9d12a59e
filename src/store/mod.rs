// src/store/mod.rs
//! Narrow persistence seams the pipeline and HTTP layer talk to.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::StoreError;
use crate::ingest::types::{Category, DedupKey, FeedSource, IngestedArticle};
use crate::sentiment::SentimentLabel;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Query for display listings. Empty filter means everything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArticleFilter {
    pub sentiment: Option<SentimentLabel>,
    pub category: Option<Category>,
    pub limit: Option<usize>,
}

impl ArticleFilter {
    pub fn matches(&self, a: &IngestedArticle) -> bool {
        self.sentiment.map_or(true, |s| s == a.sentiment_label)
            && self.category.map_or(true, |c| c == a.category)
    }
}

/// Article persistence. `insert` must never overwrite: a second insert with
/// the same dedup key returns `Ok(false)` and leaves the stored row alone.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn exists(&self, key: &DedupKey) -> StoreResult<bool>;
    async fn insert(&self, article: &IngestedArticle) -> StoreResult<bool>;
    /// Newest first by publish time.
    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<IngestedArticle>>;
    async fn count(&self) -> StoreResult<u64>;
}

/// Read side of the feed list. Re-read at the start of every run.
#[async_trait]
pub trait SourceDirectory: Send + Sync {
    async fn list_sources(&self) -> StoreResult<Vec<FeedSource>>;
}
