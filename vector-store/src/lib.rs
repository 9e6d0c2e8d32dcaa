//! Backend-agnostic vector store: document ingestion + retrieval over
//! interchangeable engines.
//!
//! This crate provides a clean API to:
//! - Chunk, embed, and upsert documents into a vector engine
//! - Retrieve top-K context by similarity or hybrid semantic+keyword ranking
//!
//! Heterogeneous engine semantics (pure cosine similarity vs. blended
//! BM25+vector, different metadata models and session lifecycles) are
//! normalized behind one contract: [`VectorBackend`]. The [`DocumentStore`]
//! facade selects an adapter at construction and exposes a single retrieval
//! surface regardless of backend; callers branch on declared capabilities
//! ([`DocumentStore::supports_hybrid`]), never on adapter identity.

pub mod backend;
mod chunker;
mod config;
mod errors;
pub mod fusion;
mod record;
mod retry;

pub use backend::pinecone::PineconeBackend;
pub use backend::weaviate::WeaviateBackend;
pub use backend::{BackendFuture, QueryRequest, VectorBackend};
pub use chunker::{Chunker, Chunks};
pub use config::{ChunkingConfig, PineconeConfig, StoreConfig, WeaviateConfig};
pub use embed_service::{EmbedError, EmbeddingsProvider};
pub use errors::{ConfigError, StoreError};
pub use record::{
    Document, IndexEntry, MetadataFilter, SearchHit, UpsertFailure, UpsertReport, entry_id,
    entry_uuid,
};
pub use retry::RetryPolicy;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::{Value, json};
use tracing::{debug, info, trace};

use crate::retry::with_retry;

/// Facade lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StoreState {
    Uninitialized,
    Ready,
    Closed,
}

impl StoreState {
    fn name(self) -> &'static str {
        match self {
            StoreState::Uninitialized => "Uninitialized",
            StoreState::Ready => "Ready",
            StoreState::Closed => "Closed",
        }
    }
}

/// High-level facade that wires chunking, embedding, and a backend adapter.
///
/// This is the single entry point recommended for application code.
/// Lifecycle: `Uninitialized → Ready → Closed`; any operation outside
/// `Ready` fails with [`StoreError::NotReady`].
pub struct DocumentStore {
    cfg: StoreConfig,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingsProvider>,
    backend: Option<Box<dyn VectorBackend>>,
    state: StoreState,
    retry: RetryPolicy,
}

impl DocumentStore {
    /// Constructs a new store over the given adapter and embedder.
    ///
    /// # Errors
    /// Returns `StoreError::Config` if the ingestion configuration is
    /// invalid (chunking bounds, batch sizes).
    pub fn new(
        backend: Box<dyn VectorBackend>,
        embedder: Arc<dyn EmbeddingsProvider>,
        cfg: StoreConfig,
    ) -> Result<Self, StoreError> {
        cfg.validate()?;
        let chunker = Chunker::new(cfg.chunking)?;
        trace!(backend = backend.name(), "DocumentStore::new");
        Ok(Self {
            cfg,
            chunker,
            embedder,
            backend: Some(backend),
            state: StoreState::Uninitialized,
            retry: RetryPolicy::default(),
        })
    }

    /// Engine label of the active adapter (for logs and reports).
    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map(|b| b.name()).unwrap_or("closed")
    }

    /// Whether the active adapter accepts an `alpha` blend weight.
    pub fn supports_hybrid(&self) -> bool {
        self.backend
            .as_ref()
            .map(|b| b.supports_hybrid())
            .unwrap_or(false)
    }

    /// Establishes the backend session and ensures the target index exists.
    ///
    /// The embedder's output dimensionality is checked against the adapter's
    /// configured index dimensionality first, so a misconfiguration fails
    /// here with [`StoreError::SchemaMismatch`] before any upsert is
    /// attempted. Calling again on a ready store is a no-op.
    ///
    /// # Errors
    /// [`StoreError::SchemaMismatch`] on dimension mismatch,
    /// [`StoreError::BackendUnavailable`] when the engine stays unreachable
    /// through the bounded retry window, [`StoreError::NotReady`] on a
    /// closed store.
    pub async fn initialize(&mut self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Ready => return Ok(()),
            StoreState::Closed => return Err(StoreError::NotReady { state: "Closed" }),
            StoreState::Uninitialized => {}
        }
        let backend = self
            .backend
            .as_deref()
            .ok_or(StoreError::NotReady { state: "Closed" })?;

        let want = backend.dimension();
        let got = self.embedder.dimension();
        if got != want {
            return Err(StoreError::SchemaMismatch {
                index: backend.name().to_string(),
                got,
                want,
            });
        }

        backend.initialize().await?;
        self.state = StoreState::Ready;
        info!(backend = backend.name(), "store ready");
        Ok(())
    }

    /// Chunks, embeds, and upserts the given documents.
    ///
    /// Entry ids derive deterministically from document id + chunk ordinal,
    /// so re-adding a document overwrites its previous entries. Returns the
    /// written count and any per-entry failures; a partially failed batch
    /// does not abort the rest.
    ///
    /// # Errors
    /// Embedding failures (after the bounded retry window) and backend
    /// transport failures; [`StoreError::NotReady`] outside `Ready`.
    pub async fn add_documents(&self, documents: &[Document]) -> Result<UpsertReport, StoreError> {
        let backend = self.ensure_ready()?;
        debug!(count = documents.len(), "add_documents");

        let indexed_at = Utc::now().to_rfc3339();
        let mut pending: Vec<(String, String, BTreeMap<String, Value>)> = Vec::new();
        for doc in documents {
            let chunks: Vec<&str> = self.chunker.split(&doc.text).collect();
            let total = chunks.len();
            for (ordinal, chunk) in chunks.into_iter().enumerate() {
                let mut metadata = doc.metadata.clone();
                metadata.insert("doc_id".to_string(), Value::String(doc.id.clone()));
                metadata.insert("chunk_index".to_string(), json!(ordinal));
                metadata.insert("total_chunks".to_string(), json!(total));
                metadata.insert("indexed_at".to_string(), Value::String(indexed_at.clone()));
                pending.push((entry_id(&doc.id, ordinal), chunk.to_string(), metadata));
            }
        }
        if pending.is_empty() {
            return Ok(UpsertReport::default());
        }

        let texts: Vec<String> = pending.iter().map(|(_, text, _)| text.clone()).collect();
        let vectors = self.embed_all(texts).await?;

        let entries: Vec<IndexEntry> = pending
            .into_iter()
            .zip(vectors)
            .map(|((id, text, metadata), vector)| IndexEntry {
                id,
                vector,
                text,
                metadata,
            })
            .collect();

        let report = backend.upsert(&entries).await?;
        info!(
            backend = backend.name(),
            written = report.written,
            failed = report.failures.len(),
            "documents indexed"
        );
        Ok(report)
    }

    /// Retrieves the `top_k` most relevant chunks for `query`.
    ///
    /// `alpha` blends keyword and semantic ranking on hybrid-capable
    /// backends (0.0 = pure keyword, 1.0 = pure semantic). Leaving it unset
    /// uses the backend default; supplying it on a non-hybrid backend fails
    /// with [`StoreError::Unsupported`].
    ///
    /// # Errors
    /// [`StoreError::Validation`] for `top_k == 0` or `alpha` outside
    /// [0.0, 1.0]; embedding and backend failures as in `add_documents`.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        alpha: Option<f32>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        self.search_filtered(query, top_k, alpha, None).await
    }

    /// [`DocumentStore::search`] with an exact-match metadata filter.
    pub async fn search_filtered(
        &self,
        query: &str,
        top_k: usize,
        alpha: Option<f32>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let backend = self.ensure_ready()?;
        if top_k == 0 {
            return Err(StoreError::Validation("top_k must be > 0".to_string()));
        }
        if let Some(a) = alpha {
            fusion::validate_alpha(a)?;
            if !backend.supports_hybrid() {
                return Err(StoreError::Unsupported(
                    "alpha: active backend has no hybrid search",
                ));
            }
        }

        let vector = with_retry(&self.retry, "embed_query", || async {
            self.embedder.embed(query).await.map_err(StoreError::from)
        })
        .await?;

        let hits = backend
            .query(QueryRequest {
                vector,
                text: query,
                top_k,
                alpha,
                filter,
            })
            .await?;
        debug!(backend = backend.name(), hits = hits.len(), "search done");
        Ok(hits)
    }

    /// Removes all entries from the target index, keeping its schema.
    ///
    /// # Errors
    /// Backend failures; [`StoreError::NotReady`] outside `Ready`.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let backend = self.ensure_ready()?;
        backend.clear().await?;
        info!(backend = backend.name(), "index cleared");
        Ok(())
    }

    /// Releases the adapter's connection resources and transitions to
    /// `Closed`. Idempotent; every later operation fails with
    /// [`StoreError::NotReady`].
    pub fn close(&mut self) {
        if self.state == StoreState::Closed {
            return;
        }
        self.backend = None;
        self.state = StoreState::Closed;
        debug!("store closed");
    }

    fn ensure_ready(&self) -> Result<&dyn VectorBackend, StoreError> {
        match self.state {
            StoreState::Ready => self
                .backend
                .as_deref()
                .ok_or(StoreError::NotReady { state: "Closed" }),
            other => Err(StoreError::NotReady { state: other.name() }),
        }
    }

    /// Embeds all chunk texts in batches with bounded concurrency.
    ///
    /// Batching is the primary throughput lever here; the fan-out stays
    /// small (`embed_concurrency`) to respect upstream rate limits. Output
    /// order matches input order.
    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, StoreError> {
        let batches: Vec<Vec<String>> = texts
            .chunks(self.cfg.embed_batch.max(1))
            .map(|b| b.to_vec())
            .collect();
        debug!(
            texts = texts.len(),
            batches = batches.len(),
            concurrency = self.cfg.embed_concurrency,
            "embedding chunks"
        );

        let mut results: Vec<(usize, Vec<Vec<f32>>)> =
            stream::iter(batches.into_iter().enumerate())
                .map(|(i, batch)| {
                    let embedder = Arc::clone(&self.embedder);
                    let retry = self.retry;
                    async move {
                        let vectors = with_retry(&retry, "embed_batch", || async {
                            embedder.embed_batch(&batch).await.map_err(StoreError::from)
                        })
                        .await?;
                        Ok::<_, StoreError>((i, vectors))
                    }
                })
                .buffer_unordered(self.cfg.embed_concurrency.max(1))
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

        results.sort_by_key(|(i, _)| *i);
        Ok(results.into_iter().flat_map(|(_, v)| v).collect())
    }
}
