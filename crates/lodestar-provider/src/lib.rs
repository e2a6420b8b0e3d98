//! The revision-history provider boundary.
//!
//! The engine never inspects repositories itself; it consumes an
//! implementation of [`RevisionHistory`] that enumerates a dependency's
//! revision timeline and serves per-revision metadata. Implementations may
//! be remote; the engine wraps calls in [`retry::with_retry`] and issues
//! them with bounded concurrency.

use std::future::Future;

use miette::Diagnostic;
use thiserror::Error;

use lodestar_core::revision::{RevisionFacts, Timeline};
use lodestar_core::source::{RevisionId, SourceId};

pub mod memory;
pub mod replay;
pub mod retry;

/// Error raised at the provider boundary.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ProviderError {
    /// The provider does not know the requested source.
    #[error("unknown source: {source_id}")]
    #[diagnostic(help("Check the source locator spelling and provider scope"))]
    UnknownSource { source_id: String },

    /// The source exists but its history is empty.
    #[error("empty revision history for {source_id}")]
    EmptyHistory { source_id: String },

    /// A lookup failed in a way that may succeed on retry (network, remote
    /// throttling).
    #[error("history lookup for {source_id} failed: {message}")]
    Lookup { source_id: String, message: String },

    /// A single provider call exceeded its deadline.
    #[error("provider call timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u64 },
}

impl ProviderError {
    /// Whether retrying the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Lookup { .. } | Self::Timeout { .. })
    }
}

/// A source of revision timelines and per-revision metadata.
///
/// `timeline` enumerates a dimension's full revision history, oldest first.
/// `facts` serves scorer metadata for one revision; the engine degrades to
/// median backfill when it fails, so implementations should not paper over
/// errors themselves.
pub trait RevisionHistory {
    fn timeline(
        &self,
        source: &SourceId,
    ) -> impl Future<Output = Result<Timeline, ProviderError>> + Send;

    fn facts(
        &self,
        source: &SourceId,
        revision: &RevisionId,
    ) -> impl Future<Output = Result<RevisionFacts, ProviderError>> + Send;
}
