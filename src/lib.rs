// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod quota;
pub mod recency;
pub mod relevance;
pub mod text;
pub mod topics;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, router, AppState};
pub use crate::engine::{FeedEngine, FeedOutcome, FeedRequest};
pub use crate::enrich::{EnrichedArticle, Enrichment};
pub use crate::error::{FallbackReason, FeedError};
