// src/api.rs
//! HTTP surface. Every `/api/news` answer is a 200: upstream and internal
//! failures surface as an empty list plus `warning`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::config::truthy;
use crate::engine::{FeedDebug, FeedEngine, FeedOutcome, FeedRequest};
use crate::enrich::EnrichedArticle;
use crate::error::FeedError;
use crate::text::truncate_chars;

pub const TOPIC_PING: &str = "ping";
pub const TOPIC_DIAG: &str = "__diag";
pub const TOPIC_MAKE_IMG: &str = "__make_img";

const MAKE_IMG_TITLE_MAX: usize = 140;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<FeedEngine>,
}

impl AppState {
    pub fn new(engine: FeedEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn from_env() -> Self {
        Self::new(FeedEngine::from_env())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(news))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router wired from the environment.
pub fn create_router() -> Router {
    router(AppState::from_env())
}

#[derive(Debug, Serialize)]
struct NewsResp {
    articles: Vec<EnrichedArticle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<FeedDebug>,
}

fn param<'a>(q: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    q.get(key).map(String::as_str)
}

async fn news(State(state): State<AppState>, Query(q): Query<HashMap<String, String>>) -> Response {
    counter!("feed_requests_total").increment(1);
    let engine = state.engine;

    let topic = param(&q, "topic").unwrap_or_default().to_string();
    match topic.as_str() {
        TOPIC_PING => return Json(json!({ "ok": true, "articles": [] })).into_response(),
        TOPIC_DIAG => return Json(engine.diagnostics()).into_response(),
        TOPIC_MAKE_IMG => {
            let raw = param(&q, "title").unwrap_or_default().trim();
            let title = truncate_chars(raw, MAKE_IMG_TITLE_MAX);
            let title = if title.is_empty() { "Noticia".to_string() } else { title };
            return Json(engine.make_image(&title).await).into_response();
        }
        _ => {}
    }

    let debug = param(&q, "debug").is_some_and(truthy);
    let req = FeedRequest {
        topic,
        window_hours: engine.config.window_for(param(&q, "hours")),
        extra_query: param(&q, "q").map(str::to_string),
        now: Utc::now(),
    };

    // Spawned so a panic inside the pipeline is caught here, not by the server.
    let task_engine = engine.clone();
    let outcome = match tokio::spawn(async move { task_engine.run(&req).await }).await {
        Ok(o) => o,
        Err(join_err) => {
            let e = FeedError::Internal(join_err.to_string());
            error!(target: "feed", error = %e, "feed pipeline aborted");
            FeedOutcome {
                warning: Some(e.to_string()),
                debug: FeedDebug {
                    error: Some(e.to_string()),
                    ..FeedDebug::default()
                },
                ..FeedOutcome::default()
            }
        }
    };

    respond(outcome, debug)
}

fn debug_headers(d: &FeedDebug) -> HeaderMap {
    let mut h = HeaderMap::new();
    let pairs = [
        ("x-feed-raw-primary", d.raw_primary),
        ("x-feed-raw-secondary", d.raw_secondary),
        ("x-feed-filtered-primary", d.filtered_primary),
        ("x-feed-filtered-secondary", d.filtered_secondary),
        ("x-feed-chosen", d.chosen),
    ];
    for (name, n) in pairs {
        h.insert(HeaderName::from_static(name), HeaderValue::from(n));
    }
    if let Some(err) = &d.error {
        let ascii: String = err
            .chars()
            .filter(|c| c.is_ascii() && !c.is_ascii_control())
            .take(200)
            .collect();
        if let Ok(v) = HeaderValue::from_str(&ascii) {
            h.insert(HeaderName::from_static("x-feed-error"), v);
        }
    }
    h
}

fn respond(outcome: FeedOutcome, debug: bool) -> Response {
    let headers = if debug { debug_headers(&outcome.debug) } else { HeaderMap::new() };
    let body = NewsResp {
        articles: outcome.articles,
        warning: outcome.warning,
        debug: debug.then_some(outcome.debug),
    };
    (StatusCode::OK, headers, Json(body)).into_response()
}
