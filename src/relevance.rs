// src/relevance.rs
//! Relevance scoring of a candidate against a resolved topic.
//!
//! Per include pattern: title hit +3, otherwise description hit +1.5.
//! Per exclude pattern hitting title or description: -5.
//! Recency bonus: (W - age) / W * 3, floored at 0, for parsable timestamps.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::types::CandidateArticle;
use crate::recency::age_hours;
use crate::topics::TopicConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub title_hit: f64,
    pub description_hit: f64,
    pub exclude_hit: f64,
    pub recency_max: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            title_hit: 3.0,
            description_hit: 1.5,
            exclude_hit: -5.0,
            recency_max: 3.0,
        }
    }
}

/// A candidate with its score for this request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub article: CandidateArticle,
    pub score: f64,
}

/// Recency bonus in `[0, weights.recency_max]`. Future timestamps count as age 0.
pub fn recency_bonus(age: f64, window_hours: f64, weights: &ScoreWeights) -> f64 {
    if !age.is_finite() || window_hours <= 0.0 {
        return 0.0;
    }
    let age = age.max(0.0);
    ((window_hours - age) / window_hours).max(0.0) * weights.recency_max
}

pub fn score_with(
    cfg: &TopicConfig,
    article: &CandidateArticle,
    window_hours: f64,
    now: DateTime<Utc>,
    weights: &ScoreWeights,
) -> f64 {
    let title = article.title.as_str();
    let desc = article.description.as_str();
    let mut score = 0.0;

    for re in &cfg.include_patterns {
        if re.is_match(title) {
            score += weights.title_hit;
        } else if re.is_match(desc) {
            score += weights.description_hit;
        }
    }
    for re in &cfg.exclude_patterns {
        if re.is_match(title) || re.is_match(desc) {
            score += weights.exclude_hit;
        }
    }

    score + recency_bonus(age_hours(article.published_at, now), window_hours, weights)
}

pub fn score(
    cfg: &TopicConfig,
    article: &CandidateArticle,
    window_hours: f64,
    now: DateTime<Utc>,
) -> f64 {
    score_with(cfg, article, window_hours, now, &ScoreWeights::default())
}

/// Score a cohort and sort descending. Stable: equal scores keep input order.
pub fn rank_cohort(
    cfg: &TopicConfig,
    articles: Vec<CandidateArticle>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = articles
        .into_iter()
        .map(|article| ScoredCandidate {
            score: score(cfg, &article, window_hours, now),
            article,
        })
        .collect();
    sort_by_score_desc(&mut scored);
    scored
}

/// Descending by score, stable for ties.
pub fn sort_by_score_desc(v: &mut [ScoredCandidate]) {
    v.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::SourceLanguage;
    use crate::topics::TopicTable;
    use chrono::Duration;

    fn art(title: &str, desc: &str, published_at: Option<DateTime<Utc>>) -> CandidateArticle {
        CandidateArticle {
            title: title.into(),
            description: desc.into(),
            url: format!("https://example.com/{}", title.len()),
            published_at,
            source_language: SourceLanguage::Primary,
            source_id: None,
            source_name: "Ejemplo".into(),
            image_url: None,
            raw_body: None,
        }
    }

    #[test]
    fn title_takes_precedence_over_description() {
        let cfg = TopicTable::builtin().resolve("astro");
        // single include pattern; hits both title and description
        let a = art("Nebulosa fotografiada", "Una nebulosa preciosa", None);
        assert_eq!(score(&cfg, &a, 24.0, Utc::now()), 3.0);
        let b = art("Foto nocturna", "Una nebulosa preciosa", None);
        assert_eq!(score(&cfg, &b, 24.0, Utc::now()), 1.5);
    }

    #[test]
    fn exclude_can_drive_negative() {
        let cfg = TopicTable::builtin().resolve("tecnología");
        let a = art("Fútbol y moda", "", None);
        assert_eq!(score(&cfg, &a, 24.0, Utc::now()), -5.0);
    }

    #[test]
    fn recency_bonus_scales_with_window() {
        let now = Utc::now();
        let cfg = TopicTable::builtin().resolve("astro");
        let fresh = art("x", "", Some(now));
        let half = art("x", "", Some(now - Duration::hours(12)));
        let old = art("x", "", Some(now - Duration::hours(30)));
        assert!((score(&cfg, &fresh, 24.0, now) - 3.0).abs() < 1e-9);
        assert!((score(&cfg, &half, 24.0, now) - 1.5).abs() < 1e-9);
        assert_eq!(score(&cfg, &old, 24.0, now), 0.0);
        // same age, wider window -> bigger bonus
        assert!((score(&cfg, &half, 48.0, now) - 2.25).abs() < 1e-9);
    }

    #[test]
    fn newer_never_scores_lower() {
        let now = Utc::now();
        let cfg = TopicTable::builtin().resolve("tecnología");
        let mut prev = f64::INFINITY;
        for h in [0i64, 1, 5, 12, 23, 24, 30, 100] {
            let a = art("Apple lanza chip", "software", Some(now - Duration::hours(h)));
            let s = score(&cfg, &a, 24.0, now);
            assert!(s <= prev, "age {h}h scored {s} > {prev}");
            prev = s;
        }
    }

    #[test]
    fn future_timestamp_is_capped() {
        let now = Utc::now();
        let bonus = recency_bonus(-10.0, 24.0, &ScoreWeights::default());
        assert_eq!(bonus, 3.0);
        let cfg = TopicTable::builtin().resolve("astro");
        let a = art("x", "", Some(now + Duration::hours(3)));
        assert_eq!(score(&cfg, &a, 24.0, now), 3.0);
    }

    #[test]
    fn rank_is_stable_for_ties() {
        let now = Utc::now();
        let cfg = TopicTable::builtin().resolve("astro");
        let ts = Some(now - Duration::hours(2));
        let list = vec![
            art("primero", "", ts),
            art("cometa", "", ts),
            art("segundo", "", ts),
        ];
        let ranked = rank_cohort(&cfg, list, 24.0, now);
        let titles: Vec<_> = ranked.iter().map(|s| s.article.title.as_str()).collect();
        assert_eq!(titles, vec!["cometa", "primero", "segundo"]);
    }
}
