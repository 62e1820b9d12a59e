//! News ingest service: binary entrypoint.
//! Opens the article store, seeds feed sources, starts the ingest scheduler
//! and serves the HTTP surface.

use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use news_sentiment_ingest::api::{self, AppState};
use news_sentiment_ingest::ingest::config::{load_config_default, load_sources_default};
use news_sentiment_ingest::ingest::scheduler::spawn_scheduler;
use news_sentiment_ingest::ingest::Ingestor;
use news_sentiment_ingest::metrics::Metrics;
use news_sentiment_ingest::store::SqliteStore;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    news_sentiment_ingest::init_tracing();

    let cfg = load_config_default().context("loading ingest config")?;

    let store = Arc::new(
        SqliteStore::connect(&cfg.database_url)
            .await
            .context("opening article store")?,
    );
    let defaults = load_sources_default().context("loading feed sources")?;
    let seeded = store
        .seed_sources_if_empty(&defaults)
        .await
        .context("seeding feed sources")?;
    if seeded > 0 {
        tracing::info!(seeded, "seeded empty source directory");
    }

    let ingestor = Ingestor::from_config(cfg, store.clone(), store)
        .context("building fetch chain")?;
    let _scheduler = spawn_scheduler(ingestor.clone(), ingestor.config().interval_secs);

    let mut router = api::router(AppState::new(ingestor));
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %e, "metrics endpoint disabled"),
    }

    Ok(router.into())
}
