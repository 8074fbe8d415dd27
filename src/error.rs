// src/error.rs
//! Failure taxonomy for the feed pipeline.
//!
//! None of these ever reaches the caller as a failure status: the HTTP layer
//! turns every `FeedError` into an empty article list plus a `warning`.

use std::fmt;

use thiserror::Error;

/// Why an enrichment call fell back to its local substitute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No credential configured for the collaborator.
    MissingCredential,
    /// Feature flag is off (e.g. AI images).
    Disabled,
    /// The call did not answer within the configured timeout.
    Timeout,
    /// Transport error or non-success status.
    Upstream(String),
    /// The collaborator answered, but with nothing usable.
    EmptyResponse,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => f.write_str("missing credential"),
            Self::Disabled => f.write_str("disabled"),
            Self::Timeout => f.write_str("timeout"),
            Self::Upstream(e) => write!(f, "upstream error: {e}"),
            Self::EmptyResponse => f.write_str("empty response"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    /// The search collaborator failed or answered with a non-success status.
    #[error("NewsAPI error: {0}")]
    Upstream(String),

    /// Anything else that went wrong while serving a request.
    #[error("Server error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Upstream(e.to_string())
    }
}
