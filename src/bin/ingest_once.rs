//! Run one ingestion pass and print the report as JSON.
//!
//! `--dry-run` keeps everything in memory (nothing is written to the
//! database); the feed list then comes straight from the source config.

use std::sync::Arc;

use anyhow::Context;
use news_sentiment_ingest::ingest::config::{load_config_default, load_sources_default};
use news_sentiment_ingest::ingest::Ingestor;
use news_sentiment_ingest::store::{MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    news_sentiment_ingest::init_tracing();

    let dry_run = std::env::args().skip(1).any(|a| a == "--dry-run");
    let cfg = load_config_default().context("loading ingest config")?;
    let sources = load_sources_default().context("loading feed sources")?;

    let ingestor = if dry_run {
        let store = Arc::new(MemoryStore::with_sources(sources));
        Ingestor::from_config(cfg, store.clone(), store)?
    } else {
        let store = Arc::new(SqliteStore::connect(&cfg.database_url).await?);
        store.seed_sources_if_empty(&sources).await?;
        Ingestor::from_config(cfg, store.clone(), store)?
    };

    let report = ingestor.ingest_all().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let total = ingestor.store().count().await?;
    tracing::info!(total, dry_run, "articles in store");

    if !report.success {
        anyhow::bail!("ingest run failed: source list unavailable");
    }
    Ok(())
}
