//! Embedding provider abstraction and HTTP clients.
//!
//! This crate exposes:
//! - [`EmbeddingsProvider`] — the pluggable trait the rest of the system
//!   depends on, one implementation per embedding backend.
//! - [`OpenAiEmbedder`] — client for an OpenAI-compatible `/v1/embeddings`
//!   endpoint.
//! - [`NoopEmbedder`] — a stand-in that always fails; useful for wiring
//!   tests that must not reach the network.
//!
//! Async is required because real providers perform HTTP requests; methods
//! return boxed futures so the trait stays dyn-compatible.

mod errors;
pub mod noop;
pub mod openai;

pub use errors::EmbedError;
pub use noop::NoopEmbedder;
pub use openai::{OpenAiEmbedder, OpenAiEmbedderConfig};

use std::{future::Future, pin::Pin};

/// Boxed future returned by provider methods.
pub type EmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EmbedError>> + Send + 'a>>;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in another embedding backend. The
/// dimensionality is a fixed property of the instance; every returned vector
/// has exactly [`EmbeddingsProvider::dimension`] components or the call
/// fails with [`EmbedError::DimensionMismatch`]. Providers never substitute
/// a zero vector for a failed upstream call.
pub trait EmbeddingsProvider: Send + Sync {
    /// Fixed output dimensionality of this provider instance.
    fn dimension(&self) -> usize;

    /// Produces an embedding vector for the given text.
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>>;

    /// Produces one embedding per input text, order preserving.
    ///
    /// Semantically equivalent to mapping [`EmbeddingsProvider::embed`] over
    /// the slice; exists so implementations can amortize round-trips into a
    /// single upstream request.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>>;
}
