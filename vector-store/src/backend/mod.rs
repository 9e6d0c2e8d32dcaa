//! Backend adapters: one per vector engine, behind a uniform contract.
//!
//! Each adapter normalizes its engine's wire protocol, session lifecycle,
//! and metadata model behind [`VectorBackend`]. Callers branch on declared
//! capabilities ([`VectorBackend::supports_hybrid`]), never on adapter
//! identity, so adding a third engine requires no facade changes.

pub mod pinecone;
pub mod weaviate;

use std::{future::Future, pin::Pin};

use crate::errors::StoreError;
use crate::record::{IndexEntry, MetadataFilter, SearchHit, UpsertReport};

/// Boxed future returned by adapter methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// One retrieval request as seen by an adapter.
#[derive(Clone, Debug)]
pub struct QueryRequest<'a> {
    /// Embedded query vector.
    pub vector: Vec<f32>,
    /// Raw query text, used by hybrid-capable engines for lexical scoring.
    pub text: &'a str,
    /// Maximum hits to return; validated > 0 by the facade.
    pub top_k: usize,
    /// Hybrid blend weight in [0.0, 1.0]; `None` means backend default.
    /// Rejected by adapters without hybrid support.
    pub alpha: Option<f32>,
    /// Optional exact-match metadata filter.
    pub filter: Option<&'a MetadataFilter>,
}

/// Uniform contract over heterogeneous vector engines.
///
/// Methods return boxed futures so the trait stays dyn-compatible; the
/// facade owns adapters as `Box<dyn VectorBackend>`.
pub trait VectorBackend: Send + Sync {
    /// Engine label for logs and reports.
    fn name(&self) -> &'static str;

    /// Configured index dimensionality.
    fn dimension(&self) -> usize;

    /// Whether `query` accepts an `alpha` blend weight.
    fn supports_hybrid(&self) -> bool {
        false
    }

    /// Establishes the session and ensures the target index/collection
    /// exists with the configured dimensionality and metadata schema.
    ///
    /// Idempotent: a second call against an already-correct index is a
    /// no-op. An existing index with a different dimensionality fails with
    /// [`StoreError::SchemaMismatch`]; an unreachable engine fails with
    /// [`StoreError::BackendUnavailable`] after a bounded retry window.
    fn initialize<'a>(&'a self) -> BackendFuture<'a, ()>;

    /// Writes or overwrites entries keyed by entry id, splitting into
    /// provider-sized batches internally. Partial failures are reported
    /// per entry in the returned [`UpsertReport`], never silently dropped.
    fn upsert<'a>(&'a self, entries: &'a [IndexEntry]) -> BackendFuture<'a, UpsertReport>;

    /// Returns at most `top_k` hits ordered by descending relevance under
    /// the engine's native metric.
    fn query<'a>(&'a self, request: QueryRequest<'a>) -> BackendFuture<'a, Vec<SearchHit>>;

    /// Removes all entries while keeping the index/schema itself.
    /// Safe to call on an empty index. Not coordinated across store
    /// instances; callers needing exclusivity serialize externally.
    fn clear<'a>(&'a self) -> BackendFuture<'a, ()>;
}

/// Trims an engine response body down to a short, log-friendly snippet.
pub(crate) fn make_snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &trimmed[..end])
}
