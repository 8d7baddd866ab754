//! Engine error taxonomy.
//!
//! Only `Configuration`-class failures are allowed to surface to a
//! `/recommend` caller; everything else degrades to empty or fallback
//! results at the call site.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing corpus source, missing required column, bad env var.
    /// Fatal at startup; a 500 on the request path.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The corpus has no articles; a vector space cannot be fitted.
    #[error("knowledge corpus is empty")]
    EmptyCorpus,

    /// The query produced no tokens after normalization.
    #[error("query is empty after tokenization")]
    EmptyQuery,

    /// Durable-store read/write failure.
    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Text-generation or notification collaborator failure. Always
    /// recovered locally with a fallback value; never propagated to the
    /// recommend caller.
    #[error("collaborator failure: {0}")]
    Collaborator(String),
}

impl EngineError {
    /// True for failures a request is allowed to surface as a 500.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Configuration(_))
    }
}
