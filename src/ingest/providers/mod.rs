// src/ingest/providers/mod.rs
pub mod fixture;
pub mod newsapi;

pub use fixture::StaticProvider;
pub use newsapi::NewsApiProvider;
