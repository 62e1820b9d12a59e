// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod conflict;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod sentiment;
pub mod store;

pub use crate::api::router;
pub use crate::ingest::{IngestReport, Ingestor};
pub use crate::sentiment::{classify, SentimentLabel, SentimentResult};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "news_sentiment_ingest=info,warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter
/// and `LOG_FORMAT=json` switches to JSON lines. A no-op when a subscriber
/// is already installed (the Shuttle runtime brings its own).
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}
