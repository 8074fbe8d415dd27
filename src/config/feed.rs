// src/config/feed.rs
use std::time::Duration;

use serde::Serialize;

use super::{non_empty, parse_or};
use crate::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use crate::quota::QuotaPolicy;

pub const ENV_WINDOW_HOURS: &str = "NEWS_WINDOW_HOURS";
pub const ENV_WINDOW_MIN_HOURS: &str = "NEWS_WINDOW_MIN_HOURS";
pub const ENV_WINDOW_MAX_HOURS: &str = "NEWS_WINDOW_MAX_HOURS";
pub const ENV_MAX_ARTICLES: &str = "NEWS_MAX_ARTICLES";
pub const ENV_QUOTA_PRIMARY: &str = "NEWS_QUOTA_PRIMARY";
pub const ENV_QUOTA_SECONDARY: &str = "NEWS_QUOTA_SECONDARY";
pub const ENV_DUP_THRESHOLD: &str = "NEWS_DUP_THRESHOLD";
pub const ENV_LOOKBACK_DAYS: &str = "NEWS_LOOKBACK_DAYS";
pub const ENV_PAGE_SIZE: &str = "NEWS_PAGE_SIZE";
pub const ENV_CALL_TIMEOUT_MS: &str = "NEWS_CALL_TIMEOUT_MS";
pub const ENV_PRIMARY_LANG: &str = "NEWS_PRIMARY_LANG";
pub const ENV_SECONDARY_LANG: &str = "NEWS_SECONDARY_LANG";
pub const ENV_DEFAULT_TOPIC: &str = "NEWS_DEFAULT_TOPIC";
pub const ENV_NEWSAPI_KEY: &str = "NEWSAPI_KEY";
pub const ENV_NEWSAPI_BASE_URL: &str = "NEWSAPI_BASE_URL";

/// Feed pipeline settings. All optional in the environment.
#[derive(Debug, Clone, Serialize)]
pub struct FeedConfig {
    pub window_hours: f64,
    pub window_min_hours: f64,
    pub window_max_hours: f64,
    pub quota: QuotaPolicy,
    pub dup_threshold: f64,
    pub lookback_days: i64,
    pub page_size: u32,
    #[serde(skip)]
    pub call_timeout: Duration,
    pub primary_lang: String,
    pub secondary_lang: String,
    /// Overrides the topic table's default topic when set.
    pub default_topic: Option<String>,
    #[serde(skip)]
    pub newsapi_key: Option<String>,
    pub newsapi_base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window_hours: 24.0,
            window_min_hours: 1.0,
            window_max_hours: 72.0,
            quota: QuotaPolicy::default(),
            dup_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            lookback_days: 2,
            page_size: 50,
            call_timeout: Duration::from_millis(10_000),
            primary_lang: "es".to_string(),
            secondary_lang: "en".to_string(),
            default_topic: None,
            newsapi_key: None,
            newsapi_base_url: "https://newsapi.org".to_string(),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; malformed values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();

        let mut min = parse_or(&lookup, ENV_WINDOW_MIN_HOURS, d.window_min_hours);
        let mut max = parse_or(&lookup, ENV_WINDOW_MAX_HOURS, d.window_max_hours);
        if !(min.is_finite() && min > 0.0) {
            min = d.window_min_hours;
        }
        if !max.is_finite() {
            max = d.window_max_hours;
        }
        if min > max {
            // keep a valid interval
            std::mem::swap(&mut min, &mut max);
        }
        let window = parse_or(&lookup, ENV_WINDOW_HOURS, d.window_hours);
        let window = if window.is_finite() {
            window.clamp(min, max)
        } else {
            d.window_hours.clamp(min, max)
        };

        let quota = QuotaPolicy {
            capacity: parse_or(&lookup, ENV_MAX_ARTICLES, d.quota.capacity),
            primary: parse_or(&lookup, ENV_QUOTA_PRIMARY, d.quota.primary),
            secondary: parse_or(&lookup, ENV_QUOTA_SECONDARY, d.quota.secondary),
        };

        let dup: f64 = parse_or(&lookup, ENV_DUP_THRESHOLD, d.dup_threshold);
        let dup = if dup.is_finite() { dup.clamp(0.0, 1.0) } else { d.dup_threshold };

        Self {
            window_hours: window,
            window_min_hours: min,
            window_max_hours: max,
            quota,
            dup_threshold: dup,
            lookback_days: parse_or(&lookup, ENV_LOOKBACK_DAYS, d.lookback_days).max(0),
            page_size: parse_or(&lookup, ENV_PAGE_SIZE, d.page_size).clamp(1, 100),
            call_timeout: Duration::from_millis(parse_or(&lookup, ENV_CALL_TIMEOUT_MS, 10_000u64)),
            primary_lang: non_empty(&lookup, ENV_PRIMARY_LANG).unwrap_or(d.primary_lang),
            secondary_lang: non_empty(&lookup, ENV_SECONDARY_LANG).unwrap_or(d.secondary_lang),
            default_topic: non_empty(&lookup, ENV_DEFAULT_TOPIC),
            newsapi_key: non_empty(&lookup, ENV_NEWSAPI_KEY),
            newsapi_base_url: non_empty(&lookup, ENV_NEWSAPI_BASE_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(d.newsapi_base_url),
        }
    }

    /// Window for one request: the caller's `hours` if it parses, clamped to
    /// the operator range; otherwise the configured default.
    pub fn window_for(&self, requested: Option<&str>) -> f64 {
        requested
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|h| h.is_finite())
            .map(|h| h.clamp(self.window_min_hours, self.window_max_hours))
            .unwrap_or(self.window_hours)
    }
}
