// src/store/sqlite.rs
//! Durable article/source store on SQLite.
//!
//! The dedup key is a `UNIQUE` constraint, so overlapping runs (scheduler
//! tick plus a manual `/ingest`) cannot double-insert even though the
//! pipeline's exists-then-insert pair is not atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

use crate::error::StoreError;
use crate::ingest::types::{timestamp_str, Category, DedupKey, FeedSource, IngestedArticle};
use crate::sentiment::SentimentLabel;
use crate::store::{ArticleFilter, ArticleStore, SourceDirectory, StoreResult};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect (creating the file and its directory if needed) and migrate.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let in_memory = database_url.contains(":memory:");
        if !in_memory {
            ensure_parent_dir(database_url);
        }
        // Each connection to `:memory:` is its own database, so keep exactly
        // one alive for the pool's lifetime.
        let mut opts = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            opts = opts.idle_timeout(None).max_lifetime(None);
        }
        let pool = opts.connect(database_url).await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rss_articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                excerpt TEXT NOT NULL,
                author TEXT NOT NULL,
                publish_date TEXT NOT NULL,
                source_url TEXT NOT NULL,
                image_url TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL,
                sentiment_label TEXT NOT NULL,
                sentiment_confidence REAL NOT NULL,
                source_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (title, source_url, publish_date)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_rss_articles_publish_date ON rss_articles (publish_date DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rss_sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Add a feed. Returns false if the URL is already registered.
    pub async fn add_source(&self, source: &FeedSource) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO rss_sources (name, url, category, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(&source.name)
        .bind(&source.url)
        .bind(source.category.as_str())
        .bind(timestamp_str(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    /// Replace the whole feed list in one transaction.
    pub async fn replace_sources(&self, sources: &[FeedSource]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM rss_sources")
            .execute(&mut *tx)
            .await?;
        let now = timestamp_str(&Utc::now());
        for s in sources {
            sqlx::query(
                r#"
                INSERT INTO rss_sources (name, url, category, created_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (url) DO NOTHING
                "#,
            )
            .bind(&s.name)
            .bind(&s.url)
            .bind(s.category.as_str())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_source(&self, url: &str) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM rss_sources WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Seed `defaults` only when no source is registered yet.
    pub async fn seed_sources_if_empty(&self, defaults: &[FeedSource]) -> StoreResult<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rss_sources")
            .fetch_one(&self.pool)
            .await?;
        if n > 0 {
            return Ok(0);
        }
        self.replace_sources(defaults).await?;
        Ok(defaults.len())
    }
}

fn ensure_parent_dir(database_url: &str) {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(error = %e, dir = %parent.display(), "cannot create database directory");
            }
        }
    }
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn exists(&self, key: &DedupKey) -> StoreResult<bool> {
        let n: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rss_articles
            WHERE title = ? AND source_url = ? AND publish_date = ?
            "#,
        )
        .bind(&key.title)
        .bind(&key.source_link)
        .bind(timestamp_str(&key.published_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(n > 0)
    }

    async fn insert(&self, a: &IngestedArticle) -> StoreResult<bool> {
        let tags = serde_json::to_string(&a.tags)
            .map_err(|e| StoreError::Corrupt(format!("tags: {e}")))?;
        let res = sqlx::query(
            r#"
            INSERT INTO rss_articles (
                id, title, content, excerpt, author, publish_date, source_url, image_url,
                category, tags, sentiment_label, sentiment_confidence, source_name, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&a.id)
        .bind(&a.title)
        .bind(&a.content)
        .bind(&a.excerpt)
        .bind(&a.author)
        .bind(timestamp_str(&a.published_at))
        .bind(&a.source_url)
        .bind(&a.image_url)
        .bind(a.category.as_str())
        .bind(tags)
        .bind(a.sentiment_label.as_str())
        .bind(a.sentiment_confidence)
        .bind(&a.source_name)
        .bind(timestamp_str(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> StoreResult<Vec<IngestedArticle>> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
            .unwrap_or(-1);
        let rows = sqlx::query_as::<_, ArticleRow>(
            r#"
            SELECT id, title, content, excerpt, author, publish_date, source_url, image_url,
                   category, tags, sentiment_label, sentiment_confidence, source_name
            FROM rss_articles
            WHERE (?1 IS NULL OR sentiment_label = ?1)
              AND (?2 IS NULL OR category = ?2)
            ORDER BY publish_date DESC, id ASC
            LIMIT ?3
            "#,
        )
        .bind(filter.sentiment.map(|s| s.as_str()))
        .bind(filter.category.map(|c| c.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IngestedArticle::try_from).collect()
    }

    async fn count(&self) -> StoreResult<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rss_articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl SourceDirectory for SqliteStore {
    async fn list_sources(&self) -> StoreResult<Vec<FeedSource>> {
        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT name, url, category FROM rss_sources ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FeedSource::try_from).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    id: String,
    title: String,
    content: String,
    excerpt: String,
    author: String,
    publish_date: String,
    source_url: String,
    image_url: String,
    category: String,
    tags: String,
    sentiment_label: String,
    sentiment_confidence: f64,
    source_name: String,
}

impl TryFrom<ArticleRow> for IngestedArticle {
    type Error = StoreError;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("article {}: {what}: {e}", row.id))
        };
        let published_at = DateTime::parse_from_rfc3339(&row.publish_date)
            .map_err(|e| corrupt("publish_date", &e))?
            .with_timezone(&Utc);
        let category: Category = row.category.parse().map_err(|e| corrupt("category", &e))?;
        let sentiment_label: SentimentLabel = row
            .sentiment_label
            .parse()
            .map_err(|e| corrupt("sentiment_label", &e))?;
        let tags: Vec<String> = serde_json::from_str(&row.tags).map_err(|e| corrupt("tags", &e))?;

        Ok(IngestedArticle {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            author: row.author,
            published_at,
            source_url: row.source_url,
            image_url: row.image_url,
            category,
            tags,
            sentiment_label,
            sentiment_confidence: row.sentiment_confidence,
            source_name: row.source_name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SourceRow {
    name: String,
    url: String,
    category: String,
}

impl TryFrom<SourceRow> for FeedSource {
    type Error = StoreError;

    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        let category: Category = row
            .category
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("source {}: category: {e}", row.url)))?;
        Ok(FeedSource::new(row.name, row.url, category))
    }
}
