// src/recency.rs
//! Recency window: article age in hours and the admit/reject test.

use chrono::{DateTime, Utc};

/// Age reported for missing/unparsable timestamps. Larger than any window.
pub const STALE_AGE_HOURS: f64 = f64::INFINITY;

/// Hours elapsed between `published_at` and `now`.
/// Future timestamps give a negative age; callers decide what that means.
pub fn age_hours(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published_at {
        Some(ts) => (now - ts).num_milliseconds() as f64 / 3_600_000.0,
        None => STALE_AGE_HOURS,
    }
}

/// Admits only articles no older than `window_hours`.
pub fn within_window(
    published_at: Option<DateTime<Utc>>,
    window_hours: f64,
    now: DateTime<Utc>,
) -> bool {
    let age = age_hours(published_at, now);
    age.is_finite() && age <= window_hours
}

/// Parse a provider timestamp (RFC 3339, e.g. `2025-01-31T10:00:00Z`).
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
