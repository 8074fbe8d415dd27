// src/dedup.rs
//! Near-duplicate detection between a candidate and the articles already
//! accepted into a selection.
//!
//! Two stages, either one is enough to reject:
//! 1. URL identity with the query string stripped.
//! 2. Jaccard similarity of the normalized title word sets >= threshold.
//!
//! This is an incremental check against a growing accepted set, not a
//! clustering pass, so acceptance order matters.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ingest::types::CandidateArticle;
use crate::text::strip_diacritics;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

static RE_NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("non-alnum regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Lowercase, strip diacritics, drop everything but ASCII letters/digits,
/// collapse whitespace.
pub fn normalize_title(s: &str) -> String {
    let folded = strip_diacritics(&s.to_lowercase());
    let spaced = RE_NON_ALNUM.replace_all(&folded, " ");
    RE_WS.replace_all(&spaced, " ").trim().to_string()
}

/// Jaccard similarity of the two titles' word sets, in `[0.0, 1.0]`.
/// An empty word set on either side gives 0.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_title(a);
    let nb = normalize_title(b);
    let wa: HashSet<&str> = na.split_whitespace().collect();
    let wb: HashSet<&str> = nb.split_whitespace().collect();
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let inter = wa.intersection(&wb).count();
    let union = wa.len() + wb.len() - inter;
    inter as f64 / union as f64
}

/// URL without its query string.
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateDetector {
    /// Jaccard threshold, clamped to `[0.0, 1.0]`.
    pub similarity_threshold: f64,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl DuplicateDetector {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold: similarity_threshold.clamp(0.0, 1.0),
        }
    }

    /// Same story? URL identity first, then title similarity.
    pub fn is_duplicate(&self, prev: &CandidateArticle, cur: &CandidateArticle) -> bool {
        if !prev.url.is_empty()
            && !cur.url.is_empty()
            && strip_query(&prev.url) == strip_query(&cur.url)
        {
            return true;
        }
        title_similarity(&prev.title, &cur.title) >= self.similarity_threshold
    }

    /// Duplicate of any already-accepted article?
    pub fn duplicates_any<'a, I>(&self, accepted: I, cur: &CandidateArticle) -> bool
    where
        I: IntoIterator<Item = &'a CandidateArticle>,
    {
        accepted.into_iter().any(|prev| self.is_duplicate(prev, cur))
    }
}
