//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A caller-supplied document to be chunked, embedded, and indexed.
///
/// Immutable once handed to the store; re-adding a document with the same id
/// regenerates its chunks and overwrites the previous entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// External identity, chosen by the caller.
    pub id: String,
    /// Raw text.
    pub text: String,
    /// Arbitrary string-keyed metadata, inherited by every chunk.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The persisted unit inside a backend: one embedded chunk plus metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Deterministic id derived from document id + chunk ordinal.
    pub id: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Chunk text.
    pub text: String,
    /// Inherited document metadata plus chunk-specific fields.
    pub metadata: BTreeMap<String, Value>,
}

/// A single retrieval hit.
///
/// `score` carries the backend's native relevance: the managed engine
/// returns its cosine similarity as-is, the hybrid engine a fused score in
/// [0, 1]. The two are intentionally not normalized to a common scale.
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: BTreeMap<String, Value>,
}

/// Outcome of a batched upsert: written count plus per-entry failures.
///
/// Partial batch failure is reported here instead of aborting the whole
/// operation; no entry is silently dropped.
#[derive(Clone, Debug, Default)]
pub struct UpsertReport {
    pub written: usize,
    pub failures: Vec<UpsertFailure>,
}

/// One entry that a backend refused during upsert.
#[derive(Clone, Debug)]
pub struct UpsertFailure {
    pub entry_id: String,
    pub message: String,
}

/// Exact-match metadata filter applied at query time.
#[derive(Clone, Debug, Default)]
pub struct MetadataFilter {
    /// Exact match per field, e.g. `("topic", "AI")`.
    pub equals: Vec<(String, Value)>,
}

/// Canonical entry id: `{document_id}#{ordinal}`.
///
/// Stable and reproducible so re-adding the same document overwrites rather
/// than duplicates.
pub fn entry_id(document_id: &str, ordinal: usize) -> String {
    format!("{document_id}#{ordinal}")
}

/// Deterministic UUIDv5 for engines that require UUID keys.
pub fn entry_uuid(entry_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, entry_id.as_bytes())
}
