// src/enrich/mod.rs
//! Enrichment pipeline: per selected article, display title, summary and
//! image are produced concurrently; all articles fan out at once.
//!
//! Each step is individually fault-tolerant. An external failure turns into
//! `Enrichment::Fallback` with a deterministic local value, never an error.

pub mod ai_adapter;
pub mod image;
pub mod summary;

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use tracing::debug;

use crate::error::FallbackReason;
use crate::ingest::types::{CandidateArticle, SourceLanguage};
use crate::relevance::ScoredCandidate;
use crate::text::anon_hash;

use self::ai_adapter::{sanitize_title, AiClients, Completion};
use self::image::{pick_image, ImageRef};
use self::summary::{
    finish_summary, local_summary, model_lines, summary_prompt, MAX_LINES, MIN_LINES,
    SUMMARY_SYSTEM,
};

pub const TITLE_SUFFIX: &str = " (ENG)";
pub const SECONDARY_MARKER: &str = "fuente original en inglés";

const TITLE_SYSTEM: &str = "Traduce títulos del inglés al español de forma natural. Devuelve SOLO el título, sin comillas ni explicaciones.";

/// Outcome of one enrichment step.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment<T> {
    /// The collaborator answered (or nothing external was needed).
    Succeeded(T),
    /// Local substitute and why it was used.
    Fallback { value: T, reason: FallbackReason },
}

impl<T> Enrichment<T> {
    pub fn value(&self) -> &T {
        match self {
            Enrichment::Succeeded(v) | Enrichment::Fallback { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Enrichment::Succeeded(v) | Enrichment::Fallback { value: v, .. } => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Enrichment::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            Enrichment::Succeeded(_) => None,
            Enrichment::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Run `fut`, mapping an elapsed timeout to `FallbackReason::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, FallbackReason>
where
    F: Future<Output = Result<T, FallbackReason>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or(Err(FallbackReason::Timeout))
}

/// Which steps fell back, for tests and debug output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentTrace {
    pub title: Option<FallbackReason>,
    pub summary: Option<FallbackReason>,
    pub image: Option<FallbackReason>,
}

/// Terminal output object, one per selected article.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedArticle {
    pub id: String,
    pub title: String,
    pub published_at: Option<String>,
    pub source_name: String,
    pub url: String,
    pub summary: String,
    pub image_url: String,
    #[serde(rename = "imageIsAI")]
    pub image_is_ai: bool,
    #[serde(skip)]
    pub trace: EnrichmentTrace,
}

/// Shared, read-only inputs of one enrichment run.
#[derive(Clone)]
pub struct EnrichContext {
    pub ai: AiClients,
    pub timeout: Duration,
    pub topic_name: String,
}

/// Secondary-language titles get translated and tagged; primary ones pass through.
pub async fn display_title(article: &CandidateArticle, ctx: &EnrichContext) -> Enrichment<String> {
    if article.source_language == SourceLanguage::Primary {
        return Enrichment::Succeeded(article.title.clone());
    }
    let user = format!("Traduce al español este titular:\n{}", article.title);
    let req = Completion {
        system: TITLE_SYSTEM,
        user: &user,
        temperature: 0.1,
    };
    let translated = with_timeout(ctx.timeout, ctx.ai.llm.complete(req))
        .await
        .map(|t| sanitize_title(&t))
        .and_then(|t| if t.is_empty() { Err(FallbackReason::EmptyResponse) } else { Ok(t) });
    match translated {
        Ok(t) => Enrichment::Succeeded(format!("{t}{TITLE_SUFFIX}")),
        Err(reason) => Enrichment::Fallback {
            value: format!("{}{TITLE_SUFFIX}", article.title),
            reason,
        },
    }
}

/// 5-10 line summary; secondary-language articles end with the marker line.
pub async fn summarize(article: &CandidateArticle, ctx: &EnrichContext) -> Enrichment<String> {
    let secondary = article.source_language == SourceLanguage::Secondary;
    let marker = secondary.then_some(SECONDARY_MARKER);
    let reserve = usize::from(secondary);

    let user = summary_prompt(article, secondary, SECONDARY_MARKER);
    let req = Completion {
        system: SUMMARY_SYSTEM,
        user: &user,
        temperature: 0.2,
    };
    let answer = with_timeout(ctx.timeout, ctx.ai.llm.complete(req))
        .await
        .map(|txt| model_lines(&txt, SECONDARY_MARKER, MIN_LINES - reserve, MAX_LINES - reserve))
        .and_then(|lines| {
            if lines.is_empty() {
                Err(FallbackReason::EmptyResponse)
            } else {
                Ok(lines)
            }
        });
    match answer {
        Ok(lines) => Enrichment::Succeeded(finish_summary(lines, article, marker)),
        Err(reason) => Enrichment::Fallback {
            value: local_summary(article, marker),
            reason,
        },
    }
}

fn note_fallback(op: &'static str, article: &CandidateArticle, e: &Enrichment<impl Sized>) {
    if let Some(reason) = e.reason() {
        counter!("feed_enrichment_fallback_total", "op" => op).increment(1);
        debug!(target: "feed", op, id = %anon_hash(&article.title), %reason, "enrichment fallback");
    }
}

/// Title, summary and image for one article, concurrently.
pub async fn enrich_article(
    index: usize,
    article: &CandidateArticle,
    ctx: &EnrichContext,
) -> EnrichedArticle {
    let (title, summary, image) = tokio::join!(
        display_title(article, ctx),
        summarize(article, ctx),
        pick_image(
            article.image_url.as_deref(),
            &article.title,
            &ctx.topic_name,
            &ctx.ai,
            ctx.timeout
        ),
    );
    note_fallback("title", article, &title);
    note_fallback("summary", article, &summary);
    note_fallback("image", article, &image);

    let trace = EnrichmentTrace {
        title: title.reason().cloned(),
        summary: summary.reason().cloned(),
        image: image.reason().cloned(),
    };
    let ImageRef { url, is_ai } = image.into_value();
    EnrichedArticle {
        id: format!("{}-{index}", article.source_id.as_deref().unwrap_or("news")),
        title: title.into_value(),
        published_at: article
            .published_at
            .map(|ts| ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        source_name: article.source_name.clone(),
        url: article.url.clone(),
        summary: summary.into_value(),
        image_url: url,
        image_is_ai: is_ai,
        trace,
    }
}

/// Full fan-out across the selection; output order follows input order.
pub async fn enrich_all(
    selection: &[ScoredCandidate],
    ctx: &EnrichContext,
) -> Vec<EnrichedArticle> {
    join_all(
        selection
            .iter()
            .enumerate()
            .map(|(i, s)| enrich_article(i, &s.article, ctx)),
    )
    .await
}
