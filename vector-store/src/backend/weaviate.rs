//! Self-hosted hybrid-search engine adapter (Weaviate REST + GraphQL API).
//!
//! Wire surface:
//! - `GET /v1/.well-known/ready` — startup probe, retried with bounded
//!   backoff at initialize (the dockerized engine may still be booting).
//! - `GET/POST /v1/schema` — ensure the collection class exists; the vector
//!   dimensionality is recorded in the class description and re-checked on
//!   every initialize.
//! - `POST /v1/batch/objects` — batched upsert with per-object results.
//! - `POST /v1/graphql` — BM25 and nearVector queries.
//! - `DELETE /v1/batch/objects` — wildcard delete keeping the schema.
//!
//! Retrieval runs the lexical and the semantic ranking as two GraphQL
//! queries and blends them client-side with [`crate::fusion`]; hit scores
//! are therefore fused values in [0, 1]. `alpha` defaults to 0.5 when the
//! caller leaves it unset.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::header;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::backend::{BackendFuture, QueryRequest, VectorBackend, make_snippet};
use crate::config::WeaviateConfig;
use crate::errors::StoreError;
use crate::fusion::{self, Candidate};
use crate::record::{IndexEntry, MetadataFilter, SearchHit, UpsertFailure, UpsertReport, entry_uuid};
use crate::retry::{RetryPolicy, with_retry};

/// Blend weight applied when the caller does not supply one.
const DEFAULT_ALPHA: f32 = 0.5;

/// Adapter for the self-hosted hybrid engine.
pub struct WeaviateBackend {
    client: reqwest::Client,
    cfg: WeaviateConfig,
    base: String,
    retry: RetryPolicy,
}

/// One raw hit from a single GraphQL ranking.
#[derive(Clone, Debug)]
struct EngineHit {
    id: String,
    text: String,
    metadata: BTreeMap<String, Value>,
    score: f32,
}

impl WeaviateBackend {
    /// Creates the adapter from validated configuration. The optional API
    /// key is injected once as a Bearer header.
    ///
    /// # Errors
    /// Returns `StoreError::Config` on invalid configuration, or a transport
    /// error if the HTTP client cannot be built.
    pub fn new(cfg: WeaviateConfig) -> Result<Self, StoreError> {
        cfg.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &cfg.api_key {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {key}"))
                    .map_err(|e| StoreError::Network(format!("invalid api key header: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let base = cfg.endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            cfg,
            base,
            retry: RetryPolicy::default(),
        })
    }

    /// Probes `/v1/.well-known/ready` until the engine answers or the
    /// bounded window runs out. Exhaustion is fatal for this call and
    /// surfaces as [`StoreError::BackendUnavailable`], which harnesses map
    /// to "skipped" rather than "failed".
    async fn wait_until_ready(&self) -> Result<(), StoreError> {
        let url = format!("{}/v1/.well-known/ready", self.base);
        for attempt in 1..=self.cfg.startup_max_attempts {
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(attempt, "engine ready");
                    return Ok(());
                }
                Ok(resp) => {
                    warn!(attempt, status = %resp.status(), "engine not ready yet");
                }
                Err(e) => {
                    warn!(attempt, error = %e, "engine unreachable");
                }
            }
            if attempt < self.cfg.startup_max_attempts {
                let delay = Duration::from_millis(self.cfg.startup_base_delay_ms)
                    * 2u32.saturating_pow(attempt - 1);
                tokio::time::sleep(delay).await;
            }
        }
        Err(StoreError::BackendUnavailable {
            endpoint: self.cfg.endpoint.clone(),
            attempts: self.cfg.startup_max_attempts,
        })
    }

    /// Ensures the class exists; re-checks the recorded dimensionality when
    /// it already does.
    async fn ensure_class(&self) -> Result<(), StoreError> {
        let url = format!("{}/v1/schema/{}", self.base, self.cfg.class_name);
        let resp = self.client.get(&url).send().await?;

        if resp.status().is_success() {
            let schema: Value = resp.json().await.map_err(|e| StoreError::Backend {
                status: None,
                message: format!("decode error: {e}"),
            })?;
            let description = schema
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if let Some(got) = parse_dimension_tag(description) {
                if got != self.cfg.dimension {
                    return Err(StoreError::SchemaMismatch {
                        index: self.cfg.class_name.clone(),
                        got,
                        want: self.cfg.dimension,
                    });
                }
            }
            debug!(class = %self.cfg.class_name, "class already exists");
            return Ok(());
        }
        if resp.status().as_u16() != 404 {
            return Err(error_from_response(resp).await);
        }

        info!(
            class = %self.cfg.class_name,
            dimension = self.cfg.dimension,
            "creating collection class"
        );
        let body = json!({
            "class": &self.cfg.class_name,
            "description": format!("Document chunks (dimension={})", self.cfg.dimension),
            "vectorizer": "none",
            "properties": [
                {"name": "content", "dataType": ["text"], "description": "Chunk text"},
                {"name": "entry_key", "dataType": ["text"], "description": "Deterministic entry id"},
            ],
        });
        let url = format!("{}/v1/schema", self.base);
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    async fn upsert_batch(&self, batch: &[IndexEntry]) -> Result<UpsertReport, StoreError> {
        // The engine keys objects by UUID; derive it from the entry id so
        // re-adding a document overwrites instead of duplicating.
        let mut by_uuid: HashMap<String, &str> = HashMap::with_capacity(batch.len());
        let objects: Vec<Value> = batch
            .iter()
            .map(|e| {
                let uuid = entry_uuid(&e.id).to_string();
                by_uuid.insert(uuid.clone(), &e.id);
                json!({
                    "class": &self.cfg.class_name,
                    "id": uuid,
                    "vector": &e.vector,
                    "properties": object_properties(e),
                })
            })
            .collect();

        let url = format!("{}/v1/batch/objects", self.base);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "objects": objects }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let results: Vec<Value> = resp.json().await.map_err(|e| StoreError::Backend {
            status: None,
            message: format!("decode error: {e}"),
        })?;

        let mut report = UpsertReport::default();
        for result in &results {
            let uuid = result.get("id").and_then(Value::as_str).unwrap_or_default();
            match object_error(result) {
                Some(message) => report.failures.push(UpsertFailure {
                    entry_id: by_uuid
                        .get(uuid)
                        .map(|s| (*s).to_string())
                        .unwrap_or_else(|| uuid.to_string()),
                    message,
                }),
                None => report.written += 1,
            }
        }
        // An engine answering with fewer results than objects would hide
        // losses; count the gap as failed.
        if results.len() < batch.len() {
            report.failures.push(UpsertFailure {
                entry_id: format!("<{} unreported entries>", batch.len() - results.len()),
                message: "batch response incomplete".to_string(),
            });
        }
        Ok(report)
    }

    async fn graphql(&self, query: String) -> Result<Value, StoreError> {
        let url = format!("{}/v1/graphql", self.base);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "query": query }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let body: Value = resp.json().await.map_err(|e| StoreError::Backend {
            status: None,
            message: format!("decode error: {e}"),
        })?;
        if let Some(message) = graphql_error(&body) {
            return Err(StoreError::Backend {
                status: None,
                message,
            });
        }
        Ok(body)
    }

    /// Property names currently on the class; auto-schema may have extended
    /// it beyond the declared core since the last upsert.
    async fn class_properties(&self) -> Result<Vec<String>, StoreError> {
        let url = format!("{}/v1/schema/{}", self.base, self.cfg.class_name);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let schema: Value = resp.json().await.map_err(|e| StoreError::Backend {
            status: None,
            message: format!("decode error: {e}"),
        })?;
        let props = schema
            .get("properties")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| p.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(props)
    }

    async fn lexical_hits(
        &self,
        text: &str,
        limit: usize,
        fields: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<EngineHit>, StoreError> {
        let where_part = filter.and_then(where_literal).unwrap_or_default();
        let query = format!(
            "{{ Get {{ {class}(limit: {limit}, bm25: {{query: \"{q}\"}}{where_part}) \
             {{ {fields} _additional {{ id score }} }} }} }}",
            class = self.cfg.class_name,
            q = graphql_escape(text),
        );
        let body = self.graphql(query).await?;
        parse_graphql_hits(&body, &self.cfg.class_name, "score")
    }

    async fn semantic_hits(
        &self,
        vector: &[f32],
        limit: usize,
        fields: &str,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<EngineHit>, StoreError> {
        let where_part = filter.and_then(where_literal).unwrap_or_default();
        let query = format!(
            "{{ Get {{ {class}(limit: {limit}, nearVector: {{vector: {vector}}}{where_part}) \
             {{ {fields} _additional {{ id certainty }} }} }} }}",
            class = self.cfg.class_name,
            vector = vector_literal(vector),
        );
        let body = self.graphql(query).await?;
        parse_graphql_hits(&body, &self.cfg.class_name, "certainty")
    }

    async fn delete_all_once(&self) -> Result<u64, StoreError> {
        let url = format!("{}/v1/batch/objects", self.base);
        let body = json!({
            "match": {
                "class": &self.cfg.class_name,
                "where": {
                    "path": ["entry_key"],
                    "operator": "Like",
                    "valueText": "*",
                },
            },
            "output": "minimal",
        });
        let resp = self.client.delete(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let parsed: Value = resp.json().await.map_err(|e| StoreError::Backend {
            status: None,
            message: format!("decode error: {e}"),
        })?;
        Ok(parsed
            .pointer("/results/matched")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

impl VectorBackend for WeaviateBackend {
    fn name(&self) -> &'static str {
        "weaviate"
    }

    fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    fn supports_hybrid(&self) -> bool {
        true
    }

    fn initialize<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.wait_until_ready().await?;
            self.ensure_class().await?;
            info!(class = %self.cfg.class_name, "weaviate backend ready");
            Ok(())
        })
    }

    fn upsert<'a>(&'a self, entries: &'a [IndexEntry]) -> BackendFuture<'a, UpsertReport> {
        Box::pin(async move {
            let mut report = UpsertReport::default();
            for batch in entries.chunks(self.cfg.upsert_batch) {
                match with_retry(&self.retry, "weaviate::upsert", || self.upsert_batch(batch))
                    .await
                {
                    Ok(part) => {
                        report.written += part.written;
                        report.failures.extend(part.failures);
                    }
                    Err(e) => {
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
                "weaviate upsert finished"
            );
            Ok(report)
        })
    }

    fn query<'a>(&'a self, request: QueryRequest<'a>) -> BackendFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            let alpha = match request.alpha {
                Some(a) => {
                    fusion::validate_alpha(a)?;
                    a
                }
                None => DEFAULT_ALPHA,
            };

            let fields = with_retry(&self.retry, "weaviate::schema", || self.class_properties())
                .await?
                .join(" ");

            // Both rankings over the same candidate budget; the blend is
            // computed here, not by the engine, so the two component scores
            // stay visible to the fusion policy.
            let lexical = with_retry(&self.retry, "weaviate::bm25", || {
                self.lexical_hits(request.text, request.top_k, &fields, request.filter)
            })
            .await?;
            let semantic = with_retry(&self.retry, "weaviate::near_vector", || {
                self.semantic_hits(&request.vector, request.top_k, &fields, request.filter)
            })
            .await?;

            let fused = fusion::fuse(merge_candidates(lexical, semantic), alpha);
            Ok(fused
                .into_iter()
                .take(request.top_k)
                .map(|(hit, score)| SearchHit { score, ..hit })
                .collect())
        })
    }

    fn clear<'a>(&'a self) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            // Batch delete caps how many objects one call may match; repeat
            // until a pass matches nothing. Empty classes terminate on the
            // first pass.
            loop {
                let matched =
                    with_retry(&self.retry, "weaviate::clear", || self.delete_all_once()).await?;
                if matched == 0 {
                    break;
                }
                debug!(matched, "cleared batch of objects");
            }
            Ok(())
        })
    }
}

/// Builds the object property map: chunk text, the deterministic entry key,
/// and the entry metadata. Non-scalar metadata values travel JSON-encoded.
fn object_properties(entry: &IndexEntry) -> Value {
    let mut props = serde_json::Map::new();
    props.insert("content".into(), Value::String(entry.text.clone()));
    props.insert("entry_key".into(), Value::String(entry.id.clone()));
    for (key, value) in &entry.metadata {
        let value = match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => value.clone(),
            other => Value::String(other.to_string()),
        };
        props.insert(property_name(key), value);
    }
    Value::Object(props)
}

/// Sanitizes a metadata key into a valid property/GraphQL identifier.
fn property_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            }
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() { "_".to_string() } else { out }
}

/// Extracts the error message of one batch-object result, if any.
fn object_error(result: &Value) -> Option<String> {
    let errors = result.pointer("/result/errors/error")?.as_array()?;
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect();
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

/// First GraphQL error message in a response body, if any.
fn graphql_error(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    errors
        .first()?
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// `dimension=N` tag recorded in the class description at create time.
fn parse_dimension_tag(description: &str) -> Option<usize> {
    let (_, rest) = description.split_once("dimension=")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn graphql_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

fn vector_literal(v: &[f32]) -> String {
    serde_json::to_string(v).unwrap_or_default()
}

/// Renders an exact-match filter as a GraphQL `where` argument.
fn where_literal(filter: &MetadataFilter) -> Option<String> {
    if filter.equals.is_empty() {
        return None;
    }
    let operands: Vec<String> = filter
        .equals
        .iter()
        .filter_map(|(field, value)| {
            let path = property_name(field);
            let typed = match value {
                Value::String(s) => format!("valueText: \"{}\"", graphql_escape(s)),
                Value::Number(n) if n.is_i64() => format!("valueInt: {n}"),
                Value::Number(n) => format!("valueNumber: {n}"),
                Value::Bool(b) => format!("valueBoolean: {b}"),
                _ => return None,
            };
            Some(format!(
                "{{path: [\"{path}\"], operator: Equal, {typed}}}"
            ))
        })
        .collect();
    if operands.is_empty() {
        return None;
    }
    Some(format!(
        ", where: {{operator: And, operands: [{}]}}",
        operands.join(", ")
    ))
}

/// Maps one GraphQL `Get` result list into engine hits.
///
/// `score_field` is `"score"` for BM25 (returned as a string) and
/// `"certainty"` for nearVector (returned as a number).
fn parse_graphql_hits(
    body: &Value,
    class: &str,
    score_field: &str,
) -> Result<Vec<EngineHit>, StoreError> {
    let rows = body
        .pointer(&format!("/data/Get/{class}"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(obj) = row.as_object() else { continue };
        let additional = obj.get("_additional").cloned().unwrap_or(Value::Null);

        let score = match additional.get(score_field) {
            Some(Value::String(s)) => s.parse::<f32>().unwrap_or(0.0),
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0) as f32,
            _ => 0.0,
        };

        let mut metadata: BTreeMap<String, Value> = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "_additional")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let text = match metadata.remove("content") {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        let id = match metadata.remove("entry_key") {
            Some(Value::String(s)) => s,
            _ => additional
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        };

        out.push(EngineHit {
            id,
            text,
            metadata,
            score,
        });
    }
    Ok(out)
}

/// Merges the two rankings into one candidate set keyed by entry id,
/// lexical hits first, preserving first-seen order for stable tie-breaks.
fn merge_candidates(
    lexical: Vec<EngineHit>,
    semantic: Vec<EngineHit>,
) -> Vec<Candidate<SearchHit>> {
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Candidate<SearchHit>> = Vec::new();

    for hit in lexical {
        let idx = out.len();
        by_id.insert(hit.id.clone(), idx);
        out.push(Candidate {
            item: SearchHit {
                id: hit.id,
                score: 0.0,
                text: hit.text,
                metadata: hit.metadata,
            },
            lexical: Some(hit.score),
            semantic: None,
        });
    }
    for hit in semantic {
        match by_id.get(&hit.id) {
            Some(&idx) => out[idx].semantic = Some(hit.score),
            None => {
                by_id.insert(hit.id.clone(), out.len());
                out.push(Candidate {
                    item: SearchHit {
                        id: hit.id,
                        score: 0.0,
                        text: hit.text,
                        metadata: hit.metadata,
                    },
                    lexical: None,
                    semantic: Some(hit.score),
                });
            }
        }
    }
    out
}

/// Maps a non-success response to `StoreError::Backend` with a body snippet.
async fn error_from_response(resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let snippet = make_snippet(&resp.text().await.unwrap_or_default());
    StoreError::Backend {
        status: Some(status),
        message: snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_tag_round_trips() {
        assert_eq!(
            parse_dimension_tag("Document chunks (dimension=1536)"),
            Some(1536)
        );
        assert_eq!(parse_dimension_tag("dimension=8"), Some(8));
        assert_eq!(parse_dimension_tag("no tag here"), None);
    }

    #[test]
    fn escape_covers_quotes_and_newlines() {
        assert_eq!(graphql_escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(graphql_escape("a\nb"), "a\\nb");
        assert_eq!(graphql_escape("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn property_names_are_sanitized() {
        assert_eq!(property_name("topic"), "topic");
        assert_eq!(property_name("chunk-index"), "chunk_index");
        assert_eq!(property_name("2nd"), "_2nd");
        assert_eq!(property_name(""), "_");
    }

    #[test]
    fn where_clause_renders_typed_operands() {
        let filter = MetadataFilter {
            equals: vec![
                ("topic".into(), Value::String("AI".into())),
                ("year".into(), json!(2024)),
            ],
        };
        let rendered = where_literal(&filter).unwrap();
        assert!(rendered.contains("operator: And"));
        assert!(rendered.contains("valueText: \"AI\""));
        assert!(rendered.contains("valueInt: 2024"));

        assert!(where_literal(&MetadataFilter::default()).is_none());
    }

    #[test]
    fn graphql_hits_parse_string_and_numeric_scores() {
        let body = json!({
            "data": {"Get": {"ResearchDocument": [
                {
                    "content": "climate text",
                    "entry_key": "climate-1#0",
                    "topic": "environment",
                    "_additional": {"id": "uuid-a", "score": "2.5"}
                },
                {
                    "content": "ai text",
                    "entry_key": "ai-1#0",
                    "_additional": {"id": "uuid-b", "score": "1.0"}
                }
            ]}}
        });
        let hits = parse_graphql_hits(&body, "ResearchDocument", "score").unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "climate-1#0");
        assert_eq!(hits[0].score, 2.5);
        assert_eq!(hits[0].text, "climate text");
        assert_eq!(hits[0].metadata["topic"], "environment");

        let body = json!({
            "data": {"Get": {"ResearchDocument": [
                {"content": "x", "entry_key": "d#0",
                 "_additional": {"id": "u", "certainty": 0.93}}
            ]}}
        });
        let hits = parse_graphql_hits(&body, "ResearchDocument", "certainty").unwrap();
        assert!((hits[0].score - 0.93).abs() < 1e-6);
    }

    #[test]
    fn graphql_errors_are_detected() {
        let body = json!({"errors": [{"message": "class not found"}]});
        assert_eq!(graphql_error(&body).as_deref(), Some("class not found"));
        assert!(graphql_error(&json!({"data": {}})).is_none());
    }

    #[test]
    fn merge_keeps_lexical_first_and_joins_by_id() {
        let lex = vec![EngineHit {
            id: "a".into(),
            text: "A".into(),
            metadata: BTreeMap::new(),
            score: 2.0,
        }];
        let sem = vec![
            EngineHit {
                id: "b".into(),
                text: "B".into(),
                metadata: BTreeMap::new(),
                score: 0.9,
            },
            EngineHit {
                id: "a".into(),
                text: "A".into(),
                metadata: BTreeMap::new(),
                score: 0.8,
            },
        ];
        let merged = merge_candidates(lex, sem);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].item.id, "a");
        assert_eq!(merged[0].lexical, Some(2.0));
        assert_eq!(merged[0].semantic, Some(0.8));
        assert_eq!(merged[1].item.id, "b");
        assert_eq!(merged[1].lexical, None);
    }

    #[test]
    fn batch_object_errors_are_extracted() {
        let ok = json!({"id": "u1", "result": {"status": "SUCCESS"}});
        assert!(object_error(&ok).is_none());

        let failed = json!({
            "id": "u2",
            "result": {"errors": {"error": [{"message": "vector length mismatch"}]}}
        });
        assert_eq!(
            object_error(&failed).as_deref(),
            Some("vector length mismatch")
        );
    }
}
