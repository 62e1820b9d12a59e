use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::ingest::types::IngestedArticle;
use crate::ingest::{IngestReport, Ingestor};
use crate::sentiment::{SentimentAnalyzer, SentimentResult};
use crate::store::{ArticleFilter, ArticleStore};

/// Upper bound for `/articles?limit=`.
const MAX_LIST_LIMIT: usize = 500;
const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<SentimentAnalyzer>,
    store: Arc<dyn ArticleStore>,
    ingestor: Ingestor,
}

impl AppState {
    /// `/classify` uses the plain lexicon engine; the conflict override is
    /// an ingest-time concern.
    pub fn new(ingestor: Ingestor) -> Self {
        Self {
            analyzer: Arc::new(SentimentAnalyzer::new()),
            store: ingestor.store(),
            ingestor,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/classify", post(classify))
        .route("/articles", get(list_articles))
        .route("/ingest", post(run_ingest))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct ClassifyReq {
    text: String,
}

async fn classify(
    State(state): State<AppState>,
    Json(body): Json<ClassifyReq>,
) -> Json<SentimentResult> {
    Json(state.analyzer.classify(&body.text))
}

async fn list_articles(
    State(state): State<AppState>,
    Query(mut filter): Query<ArticleFilter>,
) -> Result<Json<Vec<IngestedArticle>>, (StatusCode, String)> {
    filter.limit = Some(
        filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .min(MAX_LIST_LIMIT),
    );
    state
        .store
        .list_articles(&filter)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::warn!(error = %e, "article listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable".to_string())
        })
}

async fn run_ingest(State(state): State<AppState>) -> Json<IngestReport> {
    Json(state.ingestor.ingest_all().await)
}
