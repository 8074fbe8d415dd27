// tests/api_http.rs
//
// HTTP-level tests for the feed Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news reserved topics (ping, __diag, __make_img)
// - GET /api/news happy path, debug headers, upstream failure as warning
// - GET /api/news with a panicking pipeline (200 + warning)

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use async_trait::async_trait;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use curated_news_feed::api;
use curated_news_feed::config::{AiSettings, FeedConfig};
use curated_news_feed::engine::FeedEngine;
use curated_news_feed::enrich::ai_adapter::AiClients;
use curated_news_feed::ingest::providers::{NewsApiProvider, StaticProvider};
use curated_news_feed::ingest::types::{
    CandidateArticle, SearchProvider, SearchQuery, SourceLanguage,
};
use curated_news_feed::topics::TopicTable;
use curated_news_feed::FeedError;

const BODY_LIMIT: usize = 1024 * 1024;

fn art(title: &str, lang: SourceLanguage, hours_ago: i64) -> CandidateArticle {
    CandidateArticle {
        title: title.into(),
        description: "Resumen breve de tecnología.".into(),
        url: format!(
            "https://news.example/{}",
            title.to_lowercase().replace(' ', "-")
        ),
        published_at: Some(Utc::now() - Duration::hours(hours_ago)),
        source_language: lang,
        source_id: Some("ejemplo".into()),
        source_name: "Ejemplo".into(),
        image_url: Some("https://img.example/a.jpg".into()),
        raw_body: None,
    }
}

fn fixture_provider() -> StaticProvider {
    use SourceLanguage::{Primary as P, Secondary as S};
    StaticProvider::new(
        vec![
            art("Apple renueva el Mac", P, 3),
            art("Microsoft actualiza Windows", P, 1),
            art("Google mejora Pixel", P, 2),
        ],
        vec![
            art("Android gets a new security patch", S, 1),
            art("Samsung unveils smartphone lineup", S, 2),
            art("Intel chip roadmap leaks", S, 3),
            art("Router firmware bug found", S, 4),
        ],
    )
}

/// Search collaborator that blows up mid-request.
struct PanickingProvider;

#[async_trait]
impl SearchProvider for PanickingProvider {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<CandidateArticle>, FeedError> {
        panic!("boom");
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

fn router_with(provider: impl SearchProvider + 'static) -> Router {
    let engine = FeedEngine::new(
        Arc::new(TopicTable::builtin()),
        Arc::new(provider),
        FeedConfig::default(),
        AiSettings::default(),
    )
    .with_ai(AiClients::disabled());
    api::router(api::AppState::new(engine))
}

async fn get(app: Router, uri: &str) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, headers, bytes)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, http::HeaderMap, Json) {
    let (status, headers, bytes) = get(app, uri).await;
    let v: Json = serde_json::from_slice(&bytes).expect("json body");
    (status, headers, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, _, bytes) = get(router_with(StaticProvider::default()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap().trim(), "OK");
}

#[tokio::test]
async fn ping_topic_short_circuits() {
    let app = router_with(StaticProvider::failing("never called"));
    let (status, _, v) = get_json(app, "/api/news?topic=ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);
    assert_eq!(v["articles"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn diag_topic_reports_configuration_booleans() {
    let app = router_with(StaticProvider::default());
    let (status, _, v) = get_json(app, "/api/news?topic=__diag").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["ok"], true);
    assert_eq!(v["hasOpenAI"], false);
    assert_eq!(v["hasNewsAPI"], false);
    assert_eq!(v["aiImages"], false);
    assert!(v["env"].is_string());
}

#[tokio::test]
async fn make_img_returns_placeholder_without_ai() {
    let app = router_with(StaticProvider::default());
    let uri = "/api/news?topic=__make_img&title=Eclipse%20total";
    let (status, _, v) = get_json(app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["isAI"], false);
    assert!(v["url"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));

    // missing title falls back to the default caption, still a placeholder
    let app = router_with(StaticProvider::default());
    let (_, _, v2) = get_json(app, "/api/news?topic=__make_img").await;
    assert_eq!(v2["isAI"], false);
    assert_ne!(v["url"], v2["url"]);
}

#[tokio::test]
async fn news_returns_language_balanced_feed() {
    let app = router_with(fixture_provider());
    let (status, headers, v) = get_json(app, "/api/news?topic=tecno").await;
    assert_eq!(status, StatusCode::OK);
    assert!(v.get("warning").is_none());
    assert!(v.get("debug").is_none());
    assert!(headers.get("x-feed-chosen").is_none());

    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 5);

    let eng: Vec<bool> = articles
        .iter()
        .map(|a| a["title"].as_str().unwrap().ends_with(" (ENG)"))
        .collect();
    assert_eq!(eng, vec![false, false, false, true, true]);

    for a in articles {
        let summary = a["summary"].as_str().unwrap();
        let lines = summary.lines().count();
        assert!((5..=10).contains(&lines), "summary lines {lines}");
        for key in ["id", "publishedAt", "sourceName", "url", "imageUrl", "imageIsAI"] {
            assert!(a.get(key).is_some(), "missing {key}");
        }
        assert_eq!(a["imageIsAI"], false);
    }
    assert_eq!(
        articles[3]["summary"].as_str().unwrap().lines().last(),
        Some("fuente original en inglés")
    );
}

#[tokio::test]
async fn debug_flag_adds_counts_and_headers() {
    let app = router_with(fixture_provider());
    let uri = "/api/news?topic=tecno&debug=1&hours=abc";
    let (status, headers, v) = get_json(app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["debug"]["rawPrimary"], 3);
    assert_eq!(v["debug"]["rawSecondary"], 4);
    assert_eq!(v["debug"]["chosen"], 5);
    // unparseable hours keeps the default window
    assert_eq!(v["debug"]["windowHours"], 24.0);
    assert_eq!(headers.get("x-feed-chosen").unwrap(), "5");
    assert_eq!(headers.get("x-feed-raw-secondary").unwrap(), "4");
    assert!(headers.get("x-feed-error").is_none());
}

#[tokio::test]
async fn narrow_window_drops_older_candidates() {
    let app = router_with(fixture_provider());
    let uri = "/api/news?topic=tecno&hours=2.5&debug=true";
    let (_, _, v) = get_json(app, uri).await;
    // fixtures are 1..=4 hours old
    assert_eq!(v["debug"]["windowHours"], 2.5);
    assert_eq!(v["debug"]["filteredPrimary"], 2);
    assert_eq!(v["debug"]["filteredSecondary"], 2);
    assert_eq!(v["articles"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn missing_newsapi_key_is_a_warning_not_a_failure() {
    let provider = NewsApiProvider::new("https://newsapi.invalid", None);
    let app = router_with(provider);
    let (status, headers, v) = get_json(app, "/api/news?topic=astro&debug=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["articles"].as_array().map(Vec::len), Some(0));
    let warning = v["warning"].as_str().expect("warning present");
    assert!(warning.contains("NewsAPI error"));
    assert!(headers.get("x-feed-error").is_some());
}

#[tokio::test]
async fn unknown_topic_still_answers() {
    let app = router_with(fixture_provider());
    let (status, _, v) = get_json(app, "/api/news?topic=paella").await;
    assert_eq!(status, StatusCode::OK);
    // no fixture mentions the literal term
    assert_eq!(v["articles"].as_array().map(Vec::len), Some(0));
    assert!(v.get("warning").is_none());
}

#[tokio::test]
async fn panicking_pipeline_is_a_warning_not_a_failure() {
    let app = router_with(PanickingProvider);
    let (status, headers, v) = get_json(app, "/api/news?topic=tecno&debug=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["articles"].as_array().map(Vec::len), Some(0));
    let warning = v["warning"].as_str().expect("warning present");
    assert!(warning.starts_with("Server error"), "{warning}");
    assert!(warning.contains("boom"), "{warning}");
    assert!(v["debug"]["error"].as_str().is_some_and(|e| e.contains("boom")));
    assert!(headers.get("x-feed-error").is_some());
}
