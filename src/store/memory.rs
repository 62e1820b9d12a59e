// src/store/memory.rs
use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::ingest::types::{DedupKey, FeedSource, IngestedArticle};
use crate::store::{ArticleFilter, ArticleStore, SourceDirectory, StoreResult};

/// In-process store for tests, demos and the one-shot binary's dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<IngestedArticle>>,
    sources: Mutex<Vec<FeedSource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sources(sources: Vec<FeedSource>) -> Self {
        Self {
            sources: Mutex::new(sources),
            ..Self::default()
        }
    }

    pub fn set_sources(&self, sources: Vec<FeedSource>) -> StoreResult<()> {
        *self.sources.lock().map_err(|_| StoreError::Poisoned)? = sources;
        Ok(())
    }

    pub fn snapshot(&self) -> StoreResult<Vec<IngestedArticle>> {
        Ok(self
            .articles
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn exists(&self, key: &DedupKey) -> StoreResult<bool> {
        let guard = self.articles.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.iter().any(|a| a.dedup_key() == *key))
    }

    async fn insert(&self, article: &IngestedArticle) -> StoreResult<bool> {
        let mut guard = self.articles.lock().map_err(|_| StoreError::Poisoned)?;
        let key = article.dedup_key();
        if guard.iter().any(|a| a.dedup_key() == key) {
            return Ok(false);
        }
        guard.push(article.clone());
        Ok(true)
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<IngestedArticle>> {
        let guard = self.articles.lock().map_err(|_| StoreError::Poisoned)?;
        let mut out: Vec<IngestedArticle> =
            guard.iter().filter(|a| filter.matches(a)).cloned().collect();
        out.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn count(&self) -> StoreResult<u64> {
        let guard = self.articles.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.len() as u64)
    }
}

#[async_trait]
impl SourceDirectory for MemoryStore {
    async fn list_sources(&self) -> StoreResult<Vec<FeedSource>> {
        Ok(self
            .sources
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }
}
