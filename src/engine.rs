// src/engine.rs
//! Feed engine: topic -> concurrent cohort fetch -> recency + topic filter
//! -> scoring -> quota allocation -> enrichment fan-out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{AiSettings, FeedConfig};
use crate::dedup::DuplicateDetector;
use crate::enrich::ai_adapter::AiClients;
use crate::enrich::image::{generate_or_placeholder, ImageRef};
use crate::enrich::{enrich_all, EnrichContext, EnrichedArticle};
use crate::ingest::providers::NewsApiProvider;
use crate::ingest::types::{CandidateArticle, SearchProvider};
use crate::ingest::{build_queries, fetch_cohorts, filter_candidates};
use crate::quota::{allocate, QuotaPolicy, SelectionSet};
use crate::relevance::rank_cohort;
use crate::topics::{TopicConfig, TopicTable};

/// One feed request after parameter defaulting/clamping.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub topic: String,
    pub window_hours: f64,
    pub extra_query: Option<String>,
    pub now: DateTime<Utc>,
}

/// Internal counters exposed when `debug` is requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDebug {
    pub topic: String,
    pub window_hours: f64,
    pub raw_primary: usize,
    pub raw_secondary: usize,
    pub filtered_primary: usize,
    pub filtered_secondary: usize,
    pub chosen: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedOutcome {
    pub articles: Vec<EnrichedArticle>,
    pub warning: Option<String>,
    pub debug: FeedDebug,
}

/// Result of the pure selection stage.
#[derive(Debug, Clone)]
pub struct Selection {
    pub set: SelectionSet,
    pub filtered_primary: usize,
    pub filtered_secondary: usize,
}

/// Filter, score and allocate. No I/O.
pub fn select_articles(
    cfg: &TopicConfig,
    primary: Vec<CandidateArticle>,
    secondary: Vec<CandidateArticle>,
    window_hours: f64,
    now: DateTime<Utc>,
    policy: &QuotaPolicy,
    detector: &DuplicateDetector,
) -> Selection {
    let fp = filter_candidates(cfg, primary, window_hours, now);
    let fs = filter_candidates(cfg, secondary, window_hours, now);
    let (filtered_primary, filtered_secondary) = (fp.len(), fs.len());
    let ranked_p = rank_cohort(cfg, fp, window_hours, now);
    let ranked_s = rank_cohort(cfg, fs, window_hours, now);
    Selection {
        set: allocate(ranked_p, ranked_s, policy, detector),
        filtered_primary,
        filtered_secondary,
    }
}

/// Booleans for the `__diag` topic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub ok: bool,
    #[serde(rename = "hasOpenAI")]
    pub has_openai: bool,
    #[serde(rename = "hasNewsAPI")]
    pub has_newsapi: bool,
    pub ai_images: bool,
    pub env: String,
}

/// Everything a request needs; built once at startup, read-only afterwards.
pub struct FeedEngine {
    pub topics: Arc<TopicTable>,
    pub provider: Arc<dyn SearchProvider>,
    pub ai: AiClients,
    pub config: FeedConfig,
    pub ai_settings: AiSettings,
}

impl FeedEngine {
    /// Production wiring from the environment (NewsAPI + OpenAI when configured).
    pub fn from_env() -> Self {
        let config = FeedConfig::from_env();
        let ai_settings = AiSettings::from_env();
        let provider = Arc::new(NewsApiProvider::new(
            &config.newsapi_base_url,
            config.newsapi_key.clone(),
        ));
        let topics = Arc::new(TopicTable::load_default());
        Self::new(topics, provider, config, ai_settings)
    }

    pub fn new(
        topics: Arc<TopicTable>,
        provider: Arc<dyn SearchProvider>,
        config: FeedConfig,
        ai_settings: AiSettings,
    ) -> Self {
        let ai = AiClients::from_settings(&ai_settings);
        Self {
            topics,
            provider,
            ai,
            config,
            ai_settings,
        }
    }

    /// Swap the collaborators (tests, offline runs).
    pub fn with_ai(mut self, ai: AiClients) -> Self {
        self.ai = ai;
        self
    }

    pub fn detector(&self) -> DuplicateDetector {
        DuplicateDetector::new(self.config.dup_threshold)
    }

    /// Empty topic string resolves the configured default topic.
    pub fn resolve_topic(&self, raw: &str) -> TopicConfig {
        match (&self.config.default_topic, raw.trim().is_empty()) {
            (Some(default), true) => self.topics.resolve(default),
            _ => self.topics.resolve(raw),
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            ok: true,
            has_openai: self.ai_settings.has_credential(),
            has_newsapi: self.config.newsapi_key.is_some(),
            ai_images: self.ai_settings.ai_images,
            env: std::env::var("SHUTTLE_ENV").unwrap_or_else(|_| "unknown".to_string()),
        }
    }

    /// Image for an arbitrary title (broken-image repair).
    pub async fn make_image(&self, title: &str) -> ImageRef {
        generate_or_placeholder(title, "Noticias", &self.ai, self.config.call_timeout)
            .await
            .into_value()
    }

    pub async fn run(&self, req: &FeedRequest) -> FeedOutcome {
        let cfg = self.resolve_topic(&req.topic);
        let mut counters = FeedDebug {
            topic: cfg.name.clone(),
            window_hours: req.window_hours,
            ..FeedDebug::default()
        };

        let (pq, sq) = build_queries(&cfg, req.extra_query.as_deref(), &self.config, req.now);
        let fetched = fetch_cohorts(self.provider.as_ref(), &pq, &sq).await;
        let warning = fetched.warning();
        counters.error = warning.clone();

        if fetched.all_failed() {
            return FeedOutcome {
                articles: Vec::new(),
                warning,
                debug: counters,
            };
        }

        let primary = fetched.primary.unwrap_or_default();
        let secondary = fetched.secondary.unwrap_or_default();
        counters.raw_primary = primary.len();
        counters.raw_secondary = secondary.len();

        let selection = select_articles(
            &cfg,
            primary,
            secondary,
            req.window_hours,
            req.now,
            &self.config.quota,
            &self.detector(),
        );
        counters.filtered_primary = selection.filtered_primary;
        counters.filtered_secondary = selection.filtered_secondary;
        counters.chosen = selection.set.len();
        counter!("feed_selected_total").increment(selection.set.len() as u64);

        let ordered = selection.set.into_display_order();
        let ctx = EnrichContext {
            ai: self.ai.clone(),
            timeout: self.config.call_timeout,
            topic_name: cfg.name.clone(),
        };
        let articles = enrich_all(&ordered, &ctx).await;

        if warning.is_some() {
            warn!(
                target: "feed",
                topic = %cfg.name,
                chosen = counters.chosen,
                "feed served with partial upstream data"
            );
        } else {
            info!(
                target: "feed",
                topic = %cfg.name,
                raw_primary = counters.raw_primary,
                raw_secondary = counters.raw_secondary,
                filtered_primary = counters.filtered_primary,
                filtered_secondary = counters.filtered_secondary,
                chosen = counters.chosen,
                "feed served"
            );
        }

        FeedOutcome {
            articles,
            warning,
            debug: counters,
        }
    }
}
