// src/ingest/mod.rs
//! Feed ingestion: source list → fetch chain → normalize → dedup → classify
//! → persist. Every failure is contained per strategy, per entry or per
//! source; a run never aborts part-way.

pub mod config;
pub mod normalize;
pub mod providers;
pub mod scheduler;
pub mod types;
pub mod xml;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::ingest::config::IngestConfig;
use crate::ingest::normalize::{article_tags, build_excerpt, normalize_entry, resolve_image};
use crate::ingest::providers::FetchChain;
use crate::ingest::types::{DedupKey, FeedEntry, FeedSource, IngestedArticle};
use crate::sentiment::SentimentAnalyzer;
use crate::store::{ArticleStore, SourceDirectory};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Ingestion runs started.");
        describe_counter!("ingest_entries_total", "Feed entries seen across all sources.");
        describe_counter!("ingest_inserted_total", "New articles persisted.");
        describe_counter!(
            "ingest_duplicates_total",
            "Entries skipped because their dedup key is already stored."
        );
        describe_counter!(
            "ingest_entry_errors_total",
            "Entries skipped for a missing date or a storage failure."
        );
        describe_counter!(
            "ingest_source_failures_total",
            "Sources skipped because every fetch strategy failed."
        );
        describe_counter!(
            "ingest_strategy_failures_total",
            "Individual fetch strategy attempts that fell through."
        );
        describe_histogram!("ingest_source_ms", "Per-source processing time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when the last ingestion run finished.");
    });
}

/// Summary of one `ingest_all` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// False only when the source list itself could not be read.
    pub success: bool,
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SourceFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Per-source counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub strategy: &'static str,
    pub entries: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryOutcome {
    Inserted,
    Duplicate,
    Skipped(&'static str),
}

/// Cheap to clone; every clone shares the run lock, so a scheduled tick and
/// an on-demand run never overlap.
#[derive(Clone)]
pub struct Ingestor {
    sources: Arc<dyn SourceDirectory>,
    store: Arc<dyn ArticleStore>,
    chain: Arc<FetchChain>,
    analyzer: SentimentAnalyzer,
    cfg: Arc<IngestConfig>,
    run_lock: Arc<Mutex<()>>,
}

impl Ingestor {
    pub fn new(
        sources: Arc<dyn SourceDirectory>,
        store: Arc<dyn ArticleStore>,
        chain: FetchChain,
        cfg: IngestConfig,
    ) -> Self {
        let analyzer = match cfg.conflict() {
            Some(c) => SentimentAnalyzer::new().with_conflict_override(c),
            None => SentimentAnalyzer::new(),
        };
        Self {
            sources,
            store,
            chain: Arc::new(chain),
            analyzer,
            cfg: Arc::new(cfg),
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build the HTTP fetch chain named in `cfg` and wire it to the stores.
    pub fn from_config(
        cfg: IngestConfig,
        sources: Arc<dyn SourceDirectory>,
        store: Arc<dyn ArticleStore>,
    ) -> Result<Self> {
        let chain = FetchChain::from_config(&cfg)?;
        Ok(Self::new(sources, store, chain, cfg))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.cfg
    }

    pub fn store(&self) -> Arc<dyn ArticleStore> {
        Arc::clone(&self.store)
    }

    /// Run one full pass over the current source list. Idempotent: entries
    /// already stored are left untouched.
    pub async fn ingest_all(&self) -> IngestReport {
        ensure_metrics_described();
        let _run = self.run_lock.lock().await;
        counter!("ingest_runs_total").increment(1);
        let t0 = Instant::now();

        let sources = match self.sources.list_sources().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read source list; run skipped");
                return IngestReport::default();
            }
        };

        let permits = Arc::new(Semaphore::new(self.cfg.max_concurrent_sources.max(1)));
        let mut set = JoinSet::new();
        for source in sources {
            let this = self.clone();
            let permits = Arc::clone(&permits);
            set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = this.ingest_source(&source).await;
                (source, outcome)
            });
        }

        let mut report = IngestReport {
            success: true,
            ..IngestReport::default()
        };
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(stats))) => {
                    report.sources_ok += 1;
                    report.inserted += stats.inserted;
                    report.duplicates += stats.duplicates;
                    report.skipped += stats.skipped;
                }
                Ok((source, Err(e))) => {
                    tracing::warn!(source = %source.name, error = %e, "source skipped");
                    counter!("ingest_source_failures_total").increment(1);
                    report.sources_failed += 1;
                    report.failures.push(SourceFailure {
                        source: source.name,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "source task aborted");
                    counter!("ingest_source_failures_total").increment(1);
                    report.sources_failed += 1;
                }
            }
        }
        report.failures.sort_by(|a, b| a.source.cmp(&b.source));

        gauge!("ingest_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "ingest run finished"
        );
        report
    }

    /// Fetch one source and process its entries sequentially.
    pub async fn ingest_source(&self, source: &FeedSource) -> Result<SourceStats> {
        let t0 = Instant::now();
        let (strategy, raw) = self.chain.fetch(source).await?;
        let mut stats = SourceStats {
            strategy,
            entries: raw.len(),
            ..SourceStats::default()
        };
        counter!("ingest_entries_total").increment(raw.len() as u64);

        for raw_entry in raw {
            let entry = normalize_entry(raw_entry);
            match self.ingest_entry(source, &entry).await {
                Ok(EntryOutcome::Inserted) => stats.inserted += 1,
                Ok(EntryOutcome::Duplicate) => stats.duplicates += 1,
                Ok(EntryOutcome::Skipped(reason)) => {
                    tracing::debug!(source = %source.name, title = %entry.title, reason, "entry skipped");
                    counter!("ingest_entry_errors_total").increment(1);
                    stats.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(source = %source.name, title = %entry.title, error = %e, "entry not stored");
                    counter!("ingest_entry_errors_total").increment(1);
                    stats.skipped += 1;
                }
            }
        }

        counter!("ingest_inserted_total").increment(stats.inserted as u64);
        counter!("ingest_duplicates_total").increment(stats.duplicates as u64);
        histogram!("ingest_source_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(
            source = %source.name,
            strategy,
            entries = stats.entries,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            "source done"
        );
        Ok(stats)
    }

    async fn ingest_entry(&self, source: &FeedSource, entry: &FeedEntry) -> Result<EntryOutcome> {
        let Some(published_at) = entry.published_at else {
            return Ok(EntryOutcome::Skipped("no parseable publish date"));
        };
        let key = DedupKey::new(&entry.title, &entry.link, published_at);
        if self.store.exists(&key).await? {
            return Ok(EntryOutcome::Duplicate);
        }
        let article = self.build_article(source, entry, published_at);
        // A concurrent run may have won the race since `exists`.
        if self.store.insert(&article).await? {
            Ok(EntryOutcome::Inserted)
        } else {
            Ok(EntryOutcome::Duplicate)
        }
    }

    /// Enrich a normalized entry into the persisted shape.
    pub fn build_article(
        &self,
        source: &FeedSource,
        entry: &FeedEntry,
        published_at: DateTime<Utc>,
    ) -> IngestedArticle {
        let key = DedupKey::new(&entry.title, &entry.link, published_at);
        let sentiment = self
            .analyzer
            .classify(&format!("{} {}", entry.title, entry.description));
        IngestedArticle {
            id: key.id(),
            title: entry.title.clone(),
            content: entry.description.clone(),
            excerpt: build_excerpt(&entry.description, self.cfg.excerpt_len),
            author: entry.author.clone().unwrap_or_else(|| source.name.clone()),
            published_at,
            source_url: entry.link.clone(),
            image_url: resolve_image(entry, &self.cfg.default_image_url),
            category: source.category,
            tags: article_tags(&source.name),
            sentiment_label: sentiment.label,
            sentiment_confidence: sentiment.confidence,
            source_name: source.name.clone(),
        }
    }
}
