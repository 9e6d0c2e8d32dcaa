//! Facade checks against in-memory fakes of the backend and the embedder.
//!
//! The fake embedder hashes words into buckets, so texts sharing words get
//! similar vectors; the fake backend ranks by cosine similarity and, in
//! hybrid mode, blends in a term-frequency lexical score through the same
//! fusion policy the real hybrid adapter uses.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use embed_service::{EmbedFuture, EmbeddingsProvider};
use vector_store::fusion::{self, Candidate};
use vector_store::{
    BackendFuture, ChunkingConfig, Document, DocumentStore, IndexEntry, QueryRequest, SearchHit,
    StoreConfig, StoreError, UpsertReport, VectorBackend,
};

// ----- fakes -----

/// Deterministic bag-of-words embedder: each word lands in a hash bucket.
struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for word in words(text) {
            let mut h = DefaultHasher::new();
            word.hash(&mut h);
            v[(h.finish() as usize) % self.dimension] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl EmbeddingsProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move { Ok(self.vector_for(text)) })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(texts.iter().map(|t| self.vector_for(t)).collect()) })
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Occurrences of query words in the text, the lexical component.
fn term_frequency(query: &str, text: &str) -> f32 {
    let text_words = words(text);
    words(query)
        .iter()
        .map(|q| text_words.iter().filter(|w| *w == q).count())
        .sum::<usize>() as f32
}

/// In-memory stand-in for a vector engine.
struct MemoryBackend {
    dimension: usize,
    hybrid: bool,
    entries: Mutex<BTreeMap<String, IndexEntry>>,
    upsert_calls: AtomicUsize,
}

impl MemoryBackend {
    fn new(dimension: usize, hybrid: bool) -> Self {
        Self {
            dimension,
            hybrid,
            entries: Mutex::new(BTreeMap::new()),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn entry_ids(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

impl VectorBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn supports_hybrid(&self) -> bool {
        self.hybrid
    }

    fn initialize<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn upsert<'a>(&'a self, entries: &'a [IndexEntry]) -> BackendFuture<'a, UpsertReport> {
        Box::pin(async move {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            let mut map = self.entries.lock().unwrap();
            for entry in entries {
                map.insert(entry.id.clone(), entry.clone());
            }
            Ok(UpsertReport {
                written: entries.len(),
                failures: Vec::new(),
            })
        })
    }

    fn query<'a>(&'a self, request: QueryRequest<'a>) -> BackendFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            if request.alpha.is_some() && !self.hybrid {
                return Err(StoreError::Unsupported("alpha on pure-vector fake"));
            }
            let entries: Vec<IndexEntry> =
                self.entries.lock().unwrap().values().cloned().collect();

            let candidates: Vec<Candidate<SearchHit>> = entries
                .into_iter()
                .map(|e| Candidate {
                    lexical: self
                        .hybrid
                        .then(|| term_frequency(request.text, &e.text)),
                    semantic: Some(cosine(&request.vector, &e.vector)),
                    item: SearchHit {
                        id: e.id,
                        score: 0.0,
                        text: e.text,
                        metadata: e.metadata,
                    },
                })
                .collect();

            let alpha = if self.hybrid {
                request.alpha.unwrap_or(0.5)
            } else {
                1.0
            };
            Ok(fusion::fuse(candidates, alpha)
                .into_iter()
                .take(request.top_k)
                .map(|(hit, score)| SearchHit { score, ..hit })
                .collect())
        })
    }

    fn clear<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.entries.lock().unwrap().clear();
            Ok(())
        })
    }
}

// ----- fixtures -----

const DIM: usize = 64;

fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            "ai-article",
            "Artificial Intelligence is transforming how we work. Machine learning \
             models can now process vast amounts of data and identify patterns that \
             humans might miss.",
        )
        .with_metadata("topic", "AI")
        .with_metadata("title", "The Future of AI"),
        Document::new(
            "climate-article",
            "Climate change is one of the most pressing issues of our time. Rising \
             temperatures affect ecosystems and human societies globally.",
        )
        .with_metadata("topic", "environment")
        .with_metadata("title", "Understanding Climate Change"),
        Document::new(
            "quantum-article",
            "Quantum computing promises to revolutionize cryptography and solve \
             complex problems exponentially faster than classical computers.",
        )
        .with_metadata("topic", "physics")
        .with_metadata("title", "Quantum Computing Explained"),
    ]
}

fn store_with(backend: Arc<MemoryBackend>) -> DocumentStore {
    let cfg = StoreConfig {
        chunking: ChunkingConfig {
            chunk_size: 1000,
            chunk_overlap: 200,
        },
        embed_batch: 8,
        embed_concurrency: 2,
    };
    DocumentStore::new(
        Box::new(SharedBackend(backend)),
        Arc::new(HashEmbedder { dimension: DIM }),
        cfg,
    )
    .unwrap()
}

/// Lets a test keep a handle on the backend the store owns.
struct SharedBackend(Arc<MemoryBackend>);

impl VectorBackend for SharedBackend {
    fn name(&self) -> &'static str {
        self.0.name()
    }
    fn dimension(&self) -> usize {
        self.0.dimension()
    }
    fn supports_hybrid(&self) -> bool {
        self.0.supports_hybrid()
    }
    fn initialize<'a>(&'a self) -> BackendFuture<'a, ()> {
        self.0.initialize()
    }
    fn upsert<'a>(&'a self, entries: &'a [IndexEntry]) -> BackendFuture<'a, UpsertReport> {
        self.0.upsert(entries)
    }
    fn query<'a>(&'a self, request: QueryRequest<'a>) -> BackendFuture<'a, Vec<SearchHit>> {
        self.0.query(request)
    }
    fn clear<'a>(&'a self) -> BackendFuture<'a, ()> {
        self.0.clear()
    }
}

// ----- scenarios -----

#[tokio::test]
async fn scenario_a_three_documents_ingest_cleanly() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend.clone());
    store.initialize().await.unwrap();

    let report = store.add_documents(&sample_documents()).await.unwrap();
    assert!(report.written >= 3);
    assert!(report.failures.is_empty());
    assert!(backend.entry_count() >= 3);
}

#[tokio::test]
async fn scenario_b_semantic_query_ranks_ai_document_first() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();
    store.add_documents(&sample_documents()).await.unwrap();

    let hits = store
        .search("artificial intelligence models", 2, None)
        .await
        .unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].metadata["topic"], "AI");
    assert!(hits.len() <= 2);
}

#[tokio::test]
async fn scenario_c_pure_keyword_alpha_surfaces_exact_match() {
    let backend = Arc::new(MemoryBackend::new(DIM, true));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();
    store.add_documents(&sample_documents()).await.unwrap();

    let hits = store.search("climate", 3, Some(0.0)).await.unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].metadata["topic"], "environment");
}

#[tokio::test]
async fn scenario_d_clear_empties_the_index() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend.clone());
    store.initialize().await.unwrap();
    store.add_documents(&sample_documents()).await.unwrap();
    assert!(backend.entry_count() > 0);

    store.clear().await.unwrap();
    let hits = store.search("anything at all", 5, None).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn scenario_e_dimension_mismatch_fails_before_any_upsert() {
    // Backend expects 16-dimensional vectors, embedder produces 64.
    let backend = Arc::new(MemoryBackend::new(16, false));
    let mut store = store_with(backend.clone());

    let err = store.initialize().await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::SchemaMismatch { got: 64, want: 16, .. }
    ));
    assert_eq!(backend.upsert_calls.load(Ordering::SeqCst), 0);

    // The store never reached Ready; ingestion is refused.
    let err = store.add_documents(&sample_documents()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotReady { .. }));
}

// ----- properties -----

#[tokio::test]
async fn re_adding_documents_is_idempotent() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend.clone());
    store.initialize().await.unwrap();

    let docs = sample_documents();
    store.add_documents(&docs).await.unwrap();
    let first_ids = backend.entry_ids();
    let first_count = backend.entry_count();

    for _ in 0..3 {
        store.add_documents(&docs).await.unwrap();
    }
    assert_eq!(backend.entry_ids(), first_ids);
    assert_eq!(backend.entry_count(), first_count);
}

#[tokio::test]
async fn round_trip_returns_indexed_substring() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();
    store.add_documents(&sample_documents()).await.unwrap();

    let hits = store
        .search("machine learning models process data", 1, None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].text.contains("Machine learning"));
}

#[tokio::test]
async fn long_documents_split_into_ordered_entries() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let cfg = StoreConfig {
        chunking: ChunkingConfig {
            chunk_size: 80,
            chunk_overlap: 10,
        },
        embed_batch: 4,
        embed_concurrency: 2,
    };
    let mut store = DocumentStore::new(
        Box::new(SharedBackend(backend.clone())),
        Arc::new(HashEmbedder { dimension: DIM }),
        cfg,
    )
    .unwrap();
    store.initialize().await.unwrap();

    let doc = &sample_documents()[0..1];
    let report = store.add_documents(doc).await.unwrap();
    assert!(report.written > 1);

    let ids = backend.entry_ids();
    assert!(ids.contains(&"ai-article#0".to_string()));
    assert!(ids.contains(&"ai-article#1".to_string()));

    let map = backend.entries.lock().unwrap();
    let first = &map["ai-article#0"];
    assert_eq!(first.metadata["chunk_index"], 0);
    assert_eq!(first.metadata["doc_id"], "ai-article");
    assert!(first.metadata["total_chunks"].as_u64().unwrap() as usize == report.written);
    assert!(first.metadata.contains_key("indexed_at"));
}

#[tokio::test]
async fn alpha_sweep_shifts_ranking_toward_semantic() {
    let backend = Arc::new(MemoryBackend::new(DIM, true));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();
    store.add_documents(&sample_documents()).await.unwrap();

    // "climate" is an exact keyword of one document only; as alpha rises the
    // keyword match may only lose rank, never gain.
    let mut last_rank = 0usize;
    for alpha in [0.0f32, 0.5, 1.0] {
        let hits = store.search("climate", 3, Some(alpha)).await.unwrap();
        let rank = hits
            .iter()
            .position(|h| h.metadata["topic"] == "environment")
            .expect("climate document present");
        assert!(rank >= last_rank, "keyword match gained rank at alpha={alpha}");
        last_rank = rank;
    }
}

// ----- boundaries & lifecycle -----

#[tokio::test]
async fn zero_top_k_is_rejected() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();

    let err = store.search("query", 0, None).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn out_of_range_alpha_is_rejected() {
    let backend = Arc::new(MemoryBackend::new(DIM, true));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();

    for alpha in [-0.1f32, 1.5, f32::NAN] {
        let err = store.search("query", 1, Some(alpha)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}

#[tokio::test]
async fn explicit_alpha_on_pure_vector_backend_is_unsupported() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend);
    store.initialize().await.unwrap();
    assert!(!store.supports_hybrid());

    let err = store.search("query", 1, Some(0.5)).await.unwrap_err();
    assert!(matches!(err, StoreError::Unsupported(_)));

    // Left at its default, the parameter is silently fine.
    assert!(store.search("query", 1, None).await.is_ok());
}

#[tokio::test]
async fn operations_outside_ready_fail_with_not_ready() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend);

    let err = store.search("query", 1, None).await.unwrap_err();
    assert!(matches!(err, StoreError::NotReady { state: "Uninitialized" }));

    store.initialize().await.unwrap();
    store.initialize().await.unwrap(); // idempotent no-op

    store.close();
    store.close(); // idempotent

    let err = store.clear().await.unwrap_err();
    assert!(matches!(err, StoreError::NotReady { state: "Closed" }));

    let err = store.initialize().await.unwrap_err();
    assert!(matches!(err, StoreError::NotReady { state: "Closed" }));
}

#[tokio::test]
async fn empty_document_set_reports_nothing_written() {
    let backend = Arc::new(MemoryBackend::new(DIM, false));
    let mut store = store_with(backend.clone());
    store.initialize().await.unwrap();

    let report = store.add_documents(&[]).await.unwrap();
    assert_eq!(report.written, 0);
    assert!(report.failures.is_empty());
    assert_eq!(backend.upsert_calls.load(Ordering::SeqCst), 0);
}
