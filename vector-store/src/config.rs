//! Runtime configuration for the store, adapters, and ingestion pipeline.
//!
//! All settings are plain typed structs with `Default` impls and `from_env`
//! constructors. Credentials are read once here, at construction, and
//! injected into adapters; nothing reads the environment inside query or
//! upsert paths.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Serverless regions the managed engine offers per cloud.
const SUPPORTED_REGIONS: &[(&str, &[&str])] = &[
    ("aws", &["us-east-1", "us-west-2", "eu-west-1"]),
    ("gcp", &["us-central1", "europe-west4"]),
    ("azure", &["eastus2"]),
];

/// Chunking parameters for document ingestion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in bytes (chunks end on character boundaries).
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in bytes.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    /// Validates `chunk_size > 0` and `0 <= chunk_overlap < chunk_size`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "chunk_size",
                detail: "must be > 0",
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::OutOfRange {
                field: "chunk_overlap",
                detail: "must be < chunk_size",
            });
        }
        Ok(())
    }
}

/// Ingestion-side knobs shared by all backends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Chunking parameters.
    pub chunking: ChunkingConfig,
    /// Texts per embedding request.
    pub embed_batch: usize,
    /// Concurrent embedding requests in flight. Batching is the primary
    /// throughput lever; keep this small to respect provider rate limits.
    pub embed_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embed_batch: 64,
            embed_concurrency: 2,
        }
    }
}

impl StoreConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables: `CHUNK_SIZE` (default 1000), `CHUNK_OVERLAP` (default 200),
    /// `EMBED_BATCH` (default 64), `EMBEDDING_CONCURRENCY` (default 2).
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a variable is set but unparsable, or the
    /// resulting values are out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = Self {
            chunking: ChunkingConfig {
                chunk_size: env_usize("CHUNK_SIZE")?.unwrap_or(1000),
                chunk_overlap: env_usize("CHUNK_OVERLAP")?.unwrap_or(200),
            },
            embed_batch: env_usize("EMBED_BATCH")?.unwrap_or(64),
            embed_concurrency: env_usize("EMBEDDING_CONCURRENCY")?.unwrap_or(2),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        if self.embed_batch == 0 {
            return Err(ConfigError::OutOfRange {
                field: "embed_batch",
                detail: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Managed cloud vector index connectivity and index parameters.
#[derive(Clone, Debug)]
pub struct PineconeConfig {
    /// API key sent as the `Api-Key` header.
    pub api_key: String,
    /// Control-plane base URL.
    pub control_url: String,
    /// Target index name.
    pub index: String,
    /// Serverless cloud provider ("aws", "gcp", "azure").
    pub cloud: String,
    /// Serverless region; must be in the supported set for `cloud`.
    pub region: String,
    /// Index dimensionality; must match the embedder output.
    pub dimension: usize,
    /// Vectors per upsert request (engine caps this at 100).
    pub upsert_batch: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            control_url: "https://api.pinecone.io".to_string(),
            index: "research-assistant".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            dimension: 1536,
            upsert_batch: 100,
            timeout_secs: 30,
        }
    }
}

impl PineconeConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables: `PINECONE_API_KEY` (required), `PINECONE_INDEX`,
    /// `PINECONE_CLOUD`, `PINECONE_REGION`, `EMBEDDING_DIM`,
    /// `UPSERT_BATCH`.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingVar`] when the key is absent, plus
    /// range/parse errors from [`PineconeConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Self {
            api_key: must_env("PINECONE_API_KEY")?,
            control_url: defaults.control_url,
            index: env_string("PINECONE_INDEX").unwrap_or(defaults.index),
            cloud: env_string("PINECONE_CLOUD").unwrap_or(defaults.cloud),
            region: env_string("PINECONE_REGION").unwrap_or(defaults.region),
            dimension: env_usize("EMBEDDING_DIM")?.unwrap_or(defaults.dimension),
            upsert_batch: env_usize("UPSERT_BATCH")?.unwrap_or(defaults.upsert_batch),
            timeout_secs: defaults.timeout_secs,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates everything except the region (checked at initialize).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar("PINECONE_API_KEY"));
        }
        validate_http_endpoint(&self.control_url)?;
        if self.dimension == 0 {
            return Err(ConfigError::OutOfRange {
                field: "dimension",
                detail: "must be > 0",
            });
        }
        if self.upsert_batch == 0 || self.upsert_batch > 100 {
            return Err(ConfigError::OutOfRange {
                field: "upsert_batch",
                detail: "must be in 1..=100",
            });
        }
        Ok(())
    }

    /// Checks the cloud/region pair against the supported serverless set.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedRegion`] so callers fail fast at
    /// initialize instead of deferring to the first query.
    pub fn validate_region(&self) -> Result<(), ConfigError> {
        let supported = SUPPORTED_REGIONS
            .iter()
            .find(|(cloud, _)| *cloud == self.cloud)
            .map(|(_, regions)| *regions)
            .unwrap_or(&[]);
        if supported.contains(&self.region.as_str()) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedRegion {
                cloud: self.cloud.clone(),
                region: self.region.clone(),
            })
        }
    }
}

/// Self-hosted hybrid engine connectivity and collection parameters.
#[derive(Clone, Debug)]
pub struct WeaviateConfig {
    /// HTTP endpoint of the engine.
    pub endpoint: String,
    /// Optional API key (Bearer); anonymous access when absent.
    pub api_key: Option<String>,
    /// Collection class name.
    pub class_name: String,
    /// Vector dimensionality; must match the embedder output.
    pub dimension: usize,
    /// Objects per batch upsert request.
    pub upsert_batch: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Readiness probe attempts before giving up at initialize.
    pub startup_max_attempts: u32,
    /// Base delay between readiness probes, doubled per attempt.
    pub startup_base_delay_ms: u64,
}

impl Default for WeaviateConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            class_name: "ResearchDocument".to_string(),
            dimension: 1536,
            upsert_batch: 100,
            timeout_secs: 30,
            startup_max_attempts: 5,
            startup_base_delay_ms: 500,
        }
    }
}

impl WeaviateConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables: `WEAVIATE_URL`, `WEAVIATE_API_KEY` (optional),
    /// `WEAVIATE_CLASS`, `EMBEDDING_DIM`, `UPSERT_BATCH`.
    ///
    /// # Errors
    /// Returns parse/range errors from [`WeaviateConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let cfg = Self {
            endpoint: env_string("WEAVIATE_URL").unwrap_or(defaults.endpoint),
            api_key: env_string("WEAVIATE_API_KEY"),
            class_name: env_string("WEAVIATE_CLASS").unwrap_or(defaults.class_name),
            dimension: env_usize("EMBEDDING_DIM")?.unwrap_or(defaults.dimension),
            upsert_batch: env_usize("UPSERT_BATCH")?.unwrap_or(defaults.upsert_batch),
            timeout_secs: defaults.timeout_secs,
            startup_max_attempts: defaults.startup_max_attempts,
            startup_base_delay_ms: defaults.startup_base_delay_ms,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_http_endpoint(&self.endpoint)?;
        if self.class_name.trim().is_empty() {
            return Err(ConfigError::MissingVar("WEAVIATE_CLASS"));
        }
        if self.dimension == 0 {
            return Err(ConfigError::OutOfRange {
                field: "dimension",
                detail: "must be > 0",
            });
        }
        if self.upsert_batch == 0 {
            return Err(ConfigError::OutOfRange {
                field: "upsert_batch",
                detail: "must be > 0",
            });
        }
        if self.startup_max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                field: "startup_max_attempts",
                detail: "must be > 0",
            });
        }
        Ok(())
    }
}

// ----- env helpers -----

/// Fetches a required, non-empty environment variable.
fn must_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

/// Optional string from env (`None` if unset or empty).
fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Optional `usize` from env (`Ok(None)` if unset/empty, error if unparsable).
fn env_usize(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            v.parse::<usize>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected usize",
                })
        }
        _ => Ok(None),
    }
}

/// Validates that an endpoint starts with `http://` or `https://`.
fn validate_http_endpoint(value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEndpoint(value.to_string()))
    }
}
