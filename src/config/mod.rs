// src/config/mod.rs
//! Runtime configuration, read from the environment (after `.env`).

pub mod ai;
pub mod feed;

pub use ai::AiSettings;
pub use feed::FeedConfig;

/// Non-empty, trimmed value for `key`.
pub(crate) fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `key` or fall back to `default` when missing or malformed.
pub(crate) fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    non_empty(lookup, key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// "1", "true", "yes", "on" (any case).
pub fn truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
