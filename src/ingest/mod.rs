// src/ingest/mod.rs
//! Candidate ingest: per-cohort search queries, concurrent fetch, and the
//! recency + topic filter applied before scoring.

pub mod providers;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::ingest::types::{CandidateArticle, SearchProvider, SearchQuery, SourceLanguage};
use crate::recency::within_window;
use crate::topics::TopicConfig;

pub use crate::text::normalize_text;

/// Topic query, AND-ed with the caller's extra term when there is one.
pub fn compose_query(cfg: &TopicConfig, extra: Option<&str>) -> String {
    match extra.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => format!("({}) AND ({})", cfg.search_query, term),
        None => cfg.search_query.clone(),
    }
}

/// One query per cohort. The date bound is coarse on purpose; the hour
/// window is enforced again locally.
pub fn build_queries(
    cfg: &TopicConfig,
    extra: Option<&str>,
    feed: &FeedConfig,
    now: DateTime<Utc>,
) -> (SearchQuery, SearchQuery) {
    let query = compose_query(cfg, extra);
    let from_date = (now - Duration::days(feed.lookback_days))
        .format("%Y-%m-%d")
        .to_string();
    let make = |language: &str, cohort| SearchQuery {
        query: query.clone(),
        language: language.to_string(),
        cohort,
        from_date: from_date.clone(),
        page_size: feed.page_size,
    };
    (
        make(&feed.primary_lang, SourceLanguage::Primary),
        make(&feed.secondary_lang, SourceLanguage::Secondary),
    )
}

/// Raw fetch result for both cohorts. A failed cohort does not sink the other.
#[derive(Debug)]
pub struct CohortFetch {
    pub primary: Result<Vec<CandidateArticle>, FeedError>,
    pub secondary: Result<Vec<CandidateArticle>, FeedError>,
}

impl CohortFetch {
    /// Combined warning text for whichever cohorts failed.
    pub fn warning(&self) -> Option<String> {
        let errs: Vec<String> = [&self.primary, &self.secondary]
            .into_iter()
            .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
            .collect();
        (!errs.is_empty()).then(|| errs.join("; "))
    }

    pub fn all_failed(&self) -> bool {
        self.primary.is_err() && self.secondary.is_err()
    }
}

/// Fetch both cohorts concurrently.
pub async fn fetch_cohorts(
    provider: &dyn SearchProvider,
    primary: &SearchQuery,
    secondary: &SearchQuery,
) -> CohortFetch {
    let (p, s) = tokio::join!(provider.search(primary), provider.search(secondary));
    for (q, r) in [(primary, &p), (secondary, &s)] {
        match r {
            Ok(v) => {
                counter!("feed_candidates_total", "lang" => q.language.clone())
                    .increment(v.len() as u64);
                debug!(
                    target: "feed",
                    provider = provider.name(),
                    lang = %q.language,
                    raw = v.len(),
                    "cohort fetched"
                );
            }
            Err(e) => {
                counter!("feed_upstream_errors_total").increment(1);
                warn!(
                    target: "feed",
                    provider = provider.name(),
                    lang = %q.language,
                    error = %e,
                    "cohort fetch failed"
                );
            }
        }
    }
    CohortFetch {
        primary: p,
        secondary: s,
    }
}

/// Keep articles inside the recency window that match the topic.
pub fn filter_candidates(
    cfg: &TopicConfig,
    articles: Vec<CandidateArticle>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Vec<CandidateArticle> {
    articles
        .into_iter()
        .filter(|a| within_window(a.published_at, window_hours, now))
        .filter(|a| cfg.matches(&a.match_text()))
        .collect()
}
