// tests/metrics.rs
//
// The recorder is process-global, so everything lives in one test.

use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use curated_news_feed::api;
use curated_news_feed::config::{AiSettings, FeedConfig};
use curated_news_feed::engine::FeedEngine;
use curated_news_feed::enrich::ai_adapter::AiClients;
use curated_news_feed::ingest::providers::StaticProvider;
use curated_news_feed::metrics::Metrics;
use curated_news_feed::topics::TopicTable;

#[tokio::test]
async fn metrics_endpoint_contains_feed_series() {
    let config = FeedConfig::default();
    let metrics = Metrics::init(&config).expect("recorder installs once per process");

    let engine = FeedEngine::new(
        Arc::new(TopicTable::builtin()),
        Arc::new(StaticProvider::failing("503 Service Unavailable")),
        config,
        AiSettings::default(),
    )
    .with_ai(AiClients::disabled());
    let app = api::router(api::AppState::new(engine)).merge(metrics.router());

    let resp = app
        .clone()
        .oneshot(Request::get("/api/news?topic=tecno").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8_lossy(&body);
    for series in [
        "feed_requests_total",
        "feed_upstream_errors_total",
        "feed_window_hours",
        "feed_capacity",
    ] {
        assert!(text.contains(series), "missing {series} in:\n{text}");
    }

    // a second install in the same process is refused
    assert!(Metrics::init(&FeedConfig::default()).is_err());
}
