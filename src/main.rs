//! Curated news feed — binary entrypoint.
//! Boots the Axum HTTP server: feed routes, `/metrics`, and tracing.

use curated_news_feed::{api, engine::FeedEngine, metrics::Metrics};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs; `RUST_LOG` overrides the default filter. Tolerates a
/// subscriber already installed by the runtime.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("curated_news_feed=info,feed=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let engine = FeedEngine::from_env();
    info!(
        window_hours = engine.config.window_hours,
        capacity = engine.config.quota.capacity,
        has_newsapi = engine.config.newsapi_key.is_some(),
        has_openai = engine.ai_settings.has_credential(),
        llm = engine.ai.llm.provider_name(),
        "feed engine ready"
    );

    let metrics = Metrics::init(&engine.config);
    let mut router = api::router(api::AppState::new(engine));
    match metrics {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = ?e, "metrics recorder not installed"),
    }

    Ok(router.into())
}
