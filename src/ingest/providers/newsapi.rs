// src/ingest/providers/newsapi.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::FeedError;
use crate::ingest::normalize_text;
use crate::ingest::types::{CandidateArticle, SearchProvider, SearchQuery, SourceLanguage};
use crate::recency::parse_timestamp;

#[derive(Debug, Deserialize)]
struct EverythingResp {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: RawSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    id: Option<String>,
    name: Option<String>,
}

fn map_article(raw: RawArticle, cohort: SourceLanguage) -> CandidateArticle {
    let clean = |s: Option<String>| s.map(|s| normalize_text(&s)).unwrap_or_default();
    CandidateArticle {
        title: clean(raw.title),
        description: clean(raw.description),
        url: raw.url.unwrap_or_default(),
        published_at: parse_timestamp(raw.published_at.as_deref()),
        source_language: cohort,
        source_id: raw.source.id.filter(|s| !s.is_empty()),
        source_name: raw
            .source
            .name
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Desconocida".to_string()),
        image_url: raw.url_to_image.filter(|s| !s.trim().is_empty()),
        raw_body: raw.content.map(|c| normalize_text(&c)).filter(|c| !c.is_empty()),
    }
}

/// Keyword search against NewsAPI `/v2/everything`.
pub struct NewsApiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("curated-news-feed/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SearchProvider for NewsApiProvider {
    async fn search(&self, q: &SearchQuery) -> Result<Vec<CandidateArticle>, FeedError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(FeedError::Upstream("NEWSAPI_KEY not configured".into()));
        };
        let page_size = q.page_size.to_string();
        let resp = self
            .http
            .get(format!("{}/v2/everything", self.base_url))
            .header("X-Api-Key", key)
            .query(&[
                ("q", q.query.as_str()),
                ("language", q.language.as_str()),
                ("sortBy", "publishedAt"),
                ("searchIn", "title,description"),
                ("from", q.from_date.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Upstream(format!("{status}: {body}")));
        }
        let body: EverythingResp = resp.json().await?;
        if body.status == "error" {
            return Err(FeedError::Upstream(
                body.message.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        Ok(body
            .articles
            .into_iter()
            .map(|a| map_article(a, q.cohort))
            .collect())
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
