// src/ingest/providers/fixture.rs
use async_trait::async_trait;

use crate::error::FeedError;
use crate::ingest::types::{CandidateArticle, SearchProvider, SearchQuery, SourceLanguage};

/// Serves fixed cohorts regardless of the query text. Used for offline runs
/// and tests; either cohort can be set to fail.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    pub primary: Vec<CandidateArticle>,
    pub secondary: Vec<CandidateArticle>,
    pub fail_primary: Option<String>,
    pub fail_secondary: Option<String>,
}

impl StaticProvider {
    pub fn new(primary: Vec<CandidateArticle>, secondary: Vec<CandidateArticle>) -> Self {
        Self {
            primary,
            secondary,
            ..Self::default()
        }
    }

    /// Both cohorts fail with `msg`.
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_primary: Some(msg.to_string()),
            fail_secondary: Some(msg.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SearchProvider for StaticProvider {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateArticle>, FeedError> {
        let (items, fail) = match query.cohort {
            SourceLanguage::Primary => (&self.primary, &self.fail_primary),
            SourceLanguage::Secondary => (&self.secondary, &self.fail_secondary),
        };
        if let Some(msg) = fail {
            return Err(FeedError::Upstream(msg.clone()));
        }
        Ok(items
            .iter()
            .cloned()
            .map(|mut a| {
                a.source_language = query.cohort;
                a
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
