// src/ingest/scheduler.rs
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::Ingestor;

/// Spawn a periodic `ingest_all`. The first tick fires immediately. Returns
/// `None` when `interval_secs` is 0 (scheduler disabled).
pub fn spawn_scheduler(ingestor: Ingestor, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("ingest scheduler disabled");
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // A run longer than the period delays the next tick instead of bursting.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = ingestor.ingest_all().await;
            tracing::info!(
                target: "ingest",
                inserted = report.inserted,
                sources_failed = report.sources_failed,
                "scheduled ingest tick"
            );
        }
    }))
}
