//! Managed cloud vector index adapter (Pinecone serverless REST API).
//!
//! Wire surface:
//! - Control plane: `GET/POST {control_url}/indexes` — describe or create
//!   the serverless index.
//! - Data plane (host returned by the control plane):
//!   `POST /vectors/upsert`, `POST /query`, `POST /vectors/delete`.
//!
//! Score semantics: hits carry the engine's cosine similarity unchanged
//! (range [-1, 1]); nothing is re-normalized here. This adapter is pure
//! vector similarity — `alpha` is rejected as unsupported.

use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::{BackendFuture, QueryRequest, VectorBackend, make_snippet};
use crate::config::PineconeConfig;
use crate::errors::StoreError;
use crate::record::{IndexEntry, MetadataFilter, SearchHit, UpsertFailure, UpsertReport};
use crate::retry::{RetryPolicy, with_retry};

/// Adapter for the managed serverless engine.
pub struct PineconeBackend {
    client: reqwest::Client,
    cfg: PineconeConfig,
    retry: RetryPolicy,
    /// Data-plane base URL, discovered at initialize.
    host: OnceLock<String>,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    host: String,
}

#[derive(Debug, Serialize)]
struct UpsertBody<'a> {
    vectors: Vec<VectorRecord<'a>>,
}

#[derive(Debug, Serialize)]
struct VectorRecord<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    vector: Vec<f32>,
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBody {
    delete_all: bool,
}

impl PineconeBackend {
    /// Creates the adapter from validated configuration. The API key is
    /// injected once here as a default header; no env access afterwards.
    ///
    /// # Errors
    /// Returns `StoreError::Config` on invalid configuration, or a transport
    /// error if the HTTP client cannot be built.
    pub fn new(cfg: PineconeConfig) -> Result<Self, StoreError> {
        cfg.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Api-Key",
            header::HeaderValue::from_str(&cfg.api_key)
                .map_err(|e| StoreError::Network(format!("invalid api key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            client,
            cfg,
            retry: RetryPolicy::default(),
            host: OnceLock::new(),
        })
    }

    fn data_url(&self, path: &str) -> Result<String, StoreError> {
        let host = self
            .host
            .get()
            .ok_or(StoreError::NotReady { state: "Uninitialized" })?;
        Ok(format!("{host}{path}"))
    }

    /// Fetches the index description, or `None` on 404.
    async fn describe_index(&self) -> Result<Option<IndexDescription>, StoreError> {
        let url = format!(
            "{}/indexes/{}",
            self.cfg.control_url.trim_end_matches('/'),
            self.cfg.index
        );
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(read_json(resp).await?))
    }

    async fn create_index(&self) -> Result<IndexDescription, StoreError> {
        info!(
            index = %self.cfg.index,
            dimension = self.cfg.dimension,
            cloud = %self.cfg.cloud,
            region = %self.cfg.region,
            "creating serverless index"
        );
        let url = format!("{}/indexes", self.cfg.control_url.trim_end_matches('/'));
        let body = CreateIndexRequest {
            name: &self.cfg.index,
            dimension: self.cfg.dimension,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.cfg.cloud,
                    region: &self.cfg.region,
                },
            },
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        read_json(resp).await
    }

    async fn query_once(&self, request: &QueryRequest<'_>) -> Result<Vec<SearchHit>, StoreError> {
        let url = self.data_url("/query")?;
        let body = QueryBody {
            vector: request.vector.clone(),
            top_k: request.top_k,
            include_metadata: true,
            include_values: false,
            filter: request.filter.map(filter_to_json),
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        let parsed: QueryResponse = read_json(resp).await?;
        Ok(parsed.matches.into_iter().map(hit_from_match).collect())
    }

    async fn clear_once(&self) -> Result<(), StoreError> {
        let url = self.data_url("/vectors/delete")?;
        let resp = self
            .client
            .post(&url)
            .json(&DeleteBody { delete_all: true })
            .send()
            .await?;
        // A namespace that never saw an upsert reports 404; clearing an
        // empty index must stay a no-op.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(resp).await?;
        debug!(index = %self.cfg.index, "index cleared");
        Ok(())
    }

    async fn upsert_batch(&self, batch: &[IndexEntry]) -> Result<usize, StoreError> {
        let url = self.data_url("/vectors/upsert")?;
        let body = UpsertBody {
            vectors: batch
                .iter()
                .map(|e| VectorRecord {
                    id: &e.id,
                    values: &e.vector,
                    metadata: payload_metadata(e),
                })
                .collect(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        let parsed: UpsertResponse = read_json(resp).await?;
        Ok(if parsed.upserted_count > 0 {
            parsed.upserted_count
        } else {
            batch.len()
        })
    }
}

impl VectorBackend for PineconeBackend {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    fn initialize<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            // Region constraints are configuration: checked before any
            // network call so a bad region never reaches the first query.
            self.cfg.validate_region()?;

            let desc = with_retry(&self.retry, "pinecone::describe_index", || {
                self.describe_index()
            })
            .await?;

            let desc = match desc {
                Some(d) => {
                    debug!(index = %self.cfg.index, "index already exists");
                    d
                }
                None => {
                    with_retry(&self.retry, "pinecone::create_index", || self.create_index())
                        .await?
                }
            };

            if desc.dimension != self.cfg.dimension {
                return Err(StoreError::SchemaMismatch {
                    index: self.cfg.index.clone(),
                    got: desc.dimension,
                    want: self.cfg.dimension,
                });
            }

            let host = if desc.host.starts_with("http") {
                desc.host
            } else {
                format!("https://{}", desc.host)
            };
            // Re-initialize against the same index keeps the first host.
            let _ = self.host.set(host);

            info!(index = %self.cfg.index, "pinecone backend ready");
            Ok(())
        })
    }

    fn upsert<'a>(&'a self, entries: &'a [IndexEntry]) -> BackendFuture<'a, UpsertReport> {
        Box::pin(async move {
            let mut report = UpsertReport::default();
            if entries.is_empty() {
                return Ok(report);
            }

            for batch in entries.chunks(self.cfg.upsert_batch) {
                match with_retry(&self.retry, "pinecone::upsert", || self.upsert_batch(batch))
                    .await
                {
                    Ok(written) => report.written += written,
                    Err(e) => {
                        // The engine rejects a request wholesale; record
                        // every entry of the batch and keep going.
                        warn!(error = %e, count = batch.len(), "upsert batch failed");
                        report.failures.extend(batch.iter().map(|entry| UpsertFailure {
                            entry_id: entry.id.clone(),
                            message: e.to_string(),
                        }));
                    }
                }
            }

            debug!(
                written = report.written,
                failed = report.failures.len(),
                "pinecone upsert finished"
            );
            Ok(report)
        })
    }

    fn query<'a>(&'a self, request: QueryRequest<'a>) -> BackendFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            if request.alpha.is_some() {
                return Err(StoreError::Unsupported(
                    "alpha: this engine is pure vector similarity",
                ));
            }
            with_retry(&self.retry, "pinecone::query", || self.query_once(&request)).await
        })
    }

    fn clear<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            with_retry(&self.retry, "pinecone::clear", || self.clear_once()).await
        })
    }
}

/// Chunk text travels inside the metadata payload under `"text"`,
/// so the query path can return it without a second lookup.
fn payload_metadata(entry: &IndexEntry) -> BTreeMap<String, Value> {
    let mut metadata = entry.metadata.clone();
    metadata.insert("text".to_string(), Value::String(entry.text.clone()));
    metadata
}

/// Exact-match filter in the engine's `$eq` syntax; multiple fields AND.
fn filter_to_json(filter: &MetadataFilter) -> Value {
    let mut obj = serde_json::Map::new();
    for (field, value) in &filter.equals {
        obj.insert(field.clone(), serde_json::json!({ "$eq": value }));
    }
    Value::Object(obj)
}

fn hit_from_match(m: Match) -> SearchHit {
    let mut metadata = m.metadata;
    let text = match metadata.remove("text") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    SearchHit {
        id: m.id,
        score: m.score,
        text,
        metadata,
    }
}

/// Maps a non-success status to `StoreError::Backend` with a body snippet.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let snippet = make_snippet(&resp.text().await.unwrap_or_default());
    Err(StoreError::Backend {
        status: Some(status.as_u16()),
        message: snippet,
    })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, StoreError> {
    let resp = check_status(resp).await?;
    resp.json::<T>().await.map_err(|e| StoreError::Backend {
        status: None,
        message: format!("decode error: {e}"),
    })
}
