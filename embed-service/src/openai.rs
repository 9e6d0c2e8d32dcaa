//! OpenAI embeddings client.
//!
//! Minimal, non-streaming client around the OpenAI REST API:
//! - POST {endpoint}/v1/embeddings — single or batched embeddings retrieval
//!
//! Constructor validation:
//! - `api_key` must be non-empty
//! - `endpoint` must start with http:// or https://
//!
//! The batch form sends the whole input array in one request; the response
//! is re-ordered by the returned `index` field, so output order always
//! matches input order.

use std::time::Duration;

use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{EmbedError, EmbedFuture, EmbeddingsProvider};

/// Configuration for the OpenAI embedding backend.
#[derive(Clone, Debug)]
pub struct OpenAiEmbedderConfig {
    /// API key sent as a Bearer token.
    pub api_key: String,
    /// Base endpoint, e.g. `https://api.openai.com`.
    pub endpoint: String,
    /// Embedding model identifier (e.g. "text-embedding-3-small").
    pub model: String,
    /// Expected embedding dimension (e.g. 1536 for text-embedding-3-small).
    pub dimension: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAiEmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_secs: 60,
        }
    }
}

/// Thin client for OpenAI-compatible embedding endpoints.
///
/// Keeps a preconfigured `reqwest::Client` with timeout and default headers.
#[derive(Debug)]
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Creates a new embedder from the given config.
    ///
    /// # Errors
    /// - [`EmbedError::MissingApiKey`] if `api_key` is empty
    /// - [`EmbedError::InvalidEndpoint`] if `endpoint` has no http/https scheme
    /// - [`EmbedError::Network`] if the HTTP client cannot be built
    pub fn new(cfg: OpenAiEmbedderConfig) -> Result<Self, EmbedError> {
        if cfg.api_key.trim().is_empty() {
            return Err(EmbedError::MissingApiKey);
        }
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(EmbedError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", cfg.api_key))
                .map_err(|e| EmbedError::Decode(format!("invalid api key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbedError::Network(e.to_string()))?;

        let url = format!("{}/v1/embeddings", endpoint.trim_end_matches('/'));

        info!(
            model = %cfg.model,
            dimension = cfg.dimension,
            timeout_secs = cfg.timeout_secs,
            "OpenAiEmbedder initialized"
        );

        Ok(Self {
            client,
            url,
            model: cfg.model,
            dimension: cfg.dimension,
        })
    }

    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), "requesting embeddings batch");

        let body = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };

        let resp = self.client.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            let code = status.as_u16();
            return Err(match code {
                401 | 403 => EmbedError::Unauthorized { status: code },
                429 => EmbedError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => EmbedError::Server {
                    status: code,
                    snippet,
                },
                _ => EmbedError::HttpStatus {
                    status: code,
                    snippet,
                },
            });
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| EmbedError::Decode(format!("embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbedError::Decode(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        // Restore input order via the index field.
        let mut out: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for row in parsed.data {
            if row.embedding.len() != self.dimension {
                return Err(EmbedError::DimensionMismatch {
                    got: row.embedding.len(),
                    want: self.dimension,
                });
            }
            let slot = out
                .get_mut(row.index)
                .ok_or_else(|| EmbedError::Decode(format!("index {} out of range", row.index)))?;
            *slot = Some(row.embedding);
        }
        out.into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| EmbedError::Decode(format!("missing embedding {i}"))))
            .collect()
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let texts = [text.to_string()];
            let mut vectors = self.request_batch(&texts).await?;
            vectors
                .pop()
                .ok_or_else(|| EmbedError::Decode("empty embeddings response".into()))
        })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(self.request_batch(texts))
    }
}

/// Trims a response body down to a short, log-friendly snippet.
fn make_snippet(body: &str) -> String {
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
