// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Which cohort an article was sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Primary,
    Secondary,
}

impl SourceLanguage {
    /// Display order: primary cohort first.
    pub fn rank(self) -> u8 {
        match self {
            SourceLanguage::Primary => 0,
            SourceLanguage::Secondary => 1,
        }
    }
}

/// One article as returned by a search collaborator. Read-only in the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    /// `None` when the provider sent nothing or something unparsable.
    pub published_at: Option<DateTime<Utc>>,
    pub source_language: SourceLanguage,
    pub source_id: Option<String>,
    pub source_name: String,
    pub image_url: Option<String>,
    pub raw_body: Option<String>,
}

impl CandidateArticle {
    /// Title and description joined, the haystack used for topic matching.
    pub fn match_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

/// A single outbound search for one cohort.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    /// Upstream language code, e.g. "es".
    pub language: String,
    pub cohort: SourceLanguage,
    /// Lower bound in `YYYY-MM-DD`; the upstream is date-granular only.
    pub from_date: String,
    pub page_size: u32,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateArticle>, FeedError>;
    fn name(&self) -> &'static str;
}
