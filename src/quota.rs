// src/quota.rs
//! Quota allocator: picks up to N articles from the two ranked cohorts,
//! preferring a primary/secondary split, backfilling from a score-sorted
//! remainder pool, and never admitting a duplicate.

use serde::Serialize;

use crate::dedup::DuplicateDetector;
use crate::relevance::{sort_by_score_desc, ScoredCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaPolicy {
    /// Hard cap on the selection size (N).
    pub capacity: usize,
    pub primary: usize,
    pub secondary: usize,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            capacity: 5,
            primary: 3,
            secondary: 2,
        }
    }
}

/// Duplicate-free selection, in acceptance order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    items: Vec<ScoredCandidate>,
}

impl SelectionSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ScoredCandidate] {
        &self.items
    }

    /// Primary cohort first, then descending score within each cohort.
    pub fn into_display_order(mut self) -> Vec<ScoredCandidate> {
        sort_by_score_desc(&mut self.items);
        self.items.sort_by_key(|s| s.article.source_language.rank());
        self.items
    }
}

struct Allocation<'d> {
    detector: &'d DuplicateDetector,
    accepted: Vec<ScoredCandidate>,
}

impl Allocation<'_> {
    fn is_dup(&self, cand: &ScoredCandidate) -> bool {
        self.detector
            .duplicates_any(self.accepted.iter().map(|s| &s.article), &cand.article)
    }

    /// Walk one cohort in order, accepting up to `max` non-duplicates.
    /// Everything not accepted is returned for the remainder pool.
    fn take_from(&mut self, cohort: Vec<ScoredCandidate>, max: usize) -> Vec<ScoredCandidate> {
        let mut taken = 0usize;
        let mut rest = Vec::new();
        for cand in cohort {
            if taken < max && !self.is_dup(&cand) {
                self.accepted.push(cand);
                taken += 1;
            } else {
                rest.push(cand);
            }
        }
        rest
    }
}

/// Both cohorts must already be sorted by descending score.
pub fn allocate(
    primary: Vec<ScoredCandidate>,
    secondary: Vec<ScoredCandidate>,
    policy: &QuotaPolicy,
    detector: &DuplicateDetector,
) -> SelectionSet {
    let cap = policy.capacity;
    let mut alloc = Allocation {
        detector,
        accepted: Vec::with_capacity(cap),
    };

    // 1-2) quotas, never past the cap
    let quota_p = policy.primary.min(cap);
    let quota_s = policy.secondary.min(cap - quota_p);
    let rest_p = alloc.take_from(primary, quota_p);
    let rest_s = alloc.take_from(secondary, quota_s);

    // 3) remainder pool, primary leftovers first so ties favour them
    let mut pool: Vec<ScoredCandidate> = rest_p.into_iter().chain(rest_s).collect();
    sort_by_score_desc(&mut pool);

    // 4) backfill
    for cand in pool {
        if alloc.accepted.len() >= cap {
            break;
        }
        if !alloc.is_dup(&cand) {
            alloc.accepted.push(cand);
        }
    }

    // 5)
    alloc.accepted.truncate(cap);
    SelectionSet {
        items: alloc.accepted,
    }
}
