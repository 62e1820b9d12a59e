// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - POST /classify
// - POST /ingest
// - GET  /articles (filters, bad query)

use std::sync::Arc;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use news_sentiment_ingest::api::{self, AppState};
use news_sentiment_ingest::ingest::config::IngestConfig;
use news_sentiment_ingest::ingest::providers::fixture::FixtureStrategy;
use news_sentiment_ingest::ingest::providers::FetchChain;
use news_sentiment_ingest::ingest::types::{Category, FeedSource};
use news_sentiment_ingest::ingest::Ingestor;
use news_sentiment_ingest::store::MemoryStore;

const BODY_LIMIT: usize = 1024 * 1024;
const FEED_URL: &str = "https://feeds.test/bbc-middle-east.xml";

/// Same Router the binary builds, over an in-memory store and a fixture chain.
fn test_router() -> Router {
    let xml = std::fs::read_to_string("tests/fixtures/feed_rss.xml").expect("fixture");
    let store = Arc::new(MemoryStore::with_sources(vec![FeedSource::new(
        "BBC Middle East",
        FEED_URL,
        Category::News,
    )]));
    let chain = FetchChain::new(vec![Box::new(
        FixtureStrategy::new("fixture").with_feed(FEED_URL, &xml),
    )]);
    let ingestor = Ingestor::new(store.clone(), store, chain, IngestConfig::default());
    api::router(AppState::new(ingestor))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    (status, bytes.to_vec())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post_json(uri: &str, v: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(v.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn classify_returns_label_and_confidence() {
    let app = test_router();
    let (status, body) = send(
        &app,
        post_json("/classify", &json!({"text": "Missile strikes kill dozens in overnight attack"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["label"], "negative");
    let c = v["confidence"].as_f64().unwrap();
    assert!((0.5..=0.95).contains(&c), "confidence {c}");
}

#[tokio::test]
async fn classify_empty_text_is_neutral() {
    let app = test_router();
    let (status, body) = send(&app, post_json("/classify", &json!({"text": ""}))).await;
    assert_eq!(status, StatusCode::OK);
    let v: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(v, json!({"label": "neutral", "confidence": 0.7}));
}

#[tokio::test]
async fn classify_rejects_missing_text() {
    let app = test_router();
    let (status, _) = send(&app, post_json("/classify", &json!({"body": "x"}))).await;
    assert!(status.is_client_error(), "status {status}");
}

#[tokio::test]
async fn ingest_then_list_articles() {
    let app = test_router();

    let (status, body) = send(&app, post_json("/ingest", &json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let report: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["inserted"], 3);
    assert_eq!(report["skipped"], 1);

    let (status, body) = send(&app, get("/articles")).await;
    assert_eq!(status, StatusCode::OK);
    let all: Vec<Json> = serde_json::from_slice(&body).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0]["title"], "Markets open & traders wait");

    let (_, body) = send(&app, get("/articles?limit=1")).await;
    let one: Vec<Json> = serde_json::from_slice(&body).unwrap();
    assert_eq!(one.len(), 1);

    let (status, body) = send(&app, get("/articles?sentiment=negative")).await;
    assert_eq!(status, StatusCode::OK);
    let neg: Vec<Json> = serde_json::from_slice(&body).unwrap();
    assert!(!neg.is_empty());
    assert!(neg.iter().all(|a| a["sentiment_label"] == "negative"));

    // Re-running over the same feed stores nothing new.
    let (_, body) = send(&app, post_json("/ingest", &json!({}))).await;
    let again: Json = serde_json::from_slice(&body).unwrap();
    assert_eq!(again["inserted"], 0);
    assert_eq!(again["duplicates"], 3);
}

#[tokio::test]
async fn unknown_sentiment_filter_is_bad_request() {
    let app = test_router();
    let (status, _) = send(&app, get("/articles?sentiment=furious")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
