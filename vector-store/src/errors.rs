//! Unified error types for the crate.
//!
//! One top-level [`StoreError`] for all public operations, with configuration
//! problems grouped in [`ConfigError`]. The taxonomy keeps retryable
//! infrastructure failures distinguishable from permanent configuration and
//! usage errors; retry loops call [`StoreError::is_transient`] instead of
//! matching variants.

use embed_service::EmbedError;
use thiserror::Error;

/// Configuration and validation errors. Fatal, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (dimensions, batch sizes, timeouts).
    #[error("invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Endpoint is empty or does not start with http/https.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The cloud/region pair is not offered by the managed engine.
    #[error("unsupported region for cloud '{cloud}': {region}")]
    UnsupportedRegion { cloud: String, region: String },

    /// A numeric field was outside of the allowed range.
    #[error("{field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}

/// Top-level error for vector store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid or unsupported configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Existing index/collection has a different dimensionality than
    /// configured. Fatal at initialize.
    #[error("schema mismatch for '{index}': dimension {got}, want {want}")]
    SchemaMismatch {
        index: String,
        got: usize,
        want: usize,
    },

    /// Embedding provider failure (transient subset is retryable).
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Backend engine unreachable after the bounded retry window.
    /// Test harnesses treat this as skip-worthy, not failed.
    #[error("backend unreachable at {endpoint} after {attempts} attempts")]
    BackendUnavailable { endpoint: String, attempts: u32 },

    /// Engine-reported failure (non-success HTTP status with body snippet).
    #[error("backend error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Backend { status: Option<u16>, message: String },

    /// Timeout at transport level.
    #[error("backend request timed out")]
    Timeout,

    /// Network/transport failure without a status (DNS/connect/reset).
    #[error("network error: {0}")]
    Network(String),

    /// Caller used a capability the active backend lacks. Programmer error.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Facade used out of lifecycle order. Programmer error.
    #[error("store is not ready (state: {state})")]
    NotReady { state: &'static str },

    /// Invalid call parameters (top_k, alpha).
    #[error("validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// True for failures a bounded retry with backoff may resolve.
    ///
    /// Schema, configuration, validation, and usage errors are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Embedding(e) => e.is_transient(),
            StoreError::BackendUnavailable { .. }
            | StoreError::Timeout
            | StoreError::Network(_) => true,
            StoreError::Backend { status, .. } => {
                matches!(status, Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return StoreError::Timeout;
        }
        if let Some(status) = e.status() {
            return StoreError::Backend {
                status: Some(status.as_u16()),
                message: e.to_string(),
            };
        }
        StoreError::Network(e.to_string())
    }
}
