//! Unified error type for embedding providers.

use thiserror::Error;

/// Errors produced when talking to an embedding backend.
///
/// Variants distinguish transient infrastructure failures (worth a bounded
/// retry) from permanent configuration or usage errors. Use
/// [`EmbedError::is_transient`] instead of matching on variants in retry
/// loops.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Required API key is missing or empty.
    #[error("missing embedding provider api key")]
    MissingApiKey,

    /// Endpoint is empty or does not start with http/https.
    #[error("invalid embedding endpoint: {0}")]
    InvalidEndpoint(String),

    /// Unauthorized (HTTP 401/403); the credential is wrong, not the network.
    #[error("embedding provider rejected credentials (status {status})")]
    Unauthorized { status: u16 },

    /// Rate limited (HTTP 429).
    #[error("embedding provider rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Upstream server failure (HTTP 5xx).
    #[error("embedding provider server error: status {status}: {snippet}")]
    Server { status: u16, snippet: String },

    /// Any other non-success HTTP status.
    #[error("embedding provider http status {status}: {snippet}")]
    HttpStatus { status: u16, snippet: String },

    /// Timeout at transport level.
    #[error("embedding request timed out")]
    Timeout,

    /// Network/transport failure without a status (DNS/connect/reset).
    #[error("embedding network error: {0}")]
    Network(String),

    /// Response payload could not be decoded as expected.
    #[error("embedding decode error: {0}")]
    Decode(String),

    /// Returned vector has the wrong dimensionality.
    #[error("embedding dimension mismatch: got {got}, want {want}")]
    DimensionMismatch { got: usize, want: usize },

    /// No real provider is configured (the no-op provider was invoked).
    #[error("no embedding provider configured")]
    NotConfigured,
}

impl EmbedError {
    /// True for failures that a bounded retry with backoff may resolve.
    ///
    /// Auth, decode, and dimensionality errors are permanent and must be
    /// surfaced immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbedError::RateLimited { .. }
                | EmbedError::Server { .. }
                | EmbedError::Timeout
                | EmbedError::Network(_)
        )
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return EmbedError::Timeout;
        }
        if let Some(status) = e.status() {
            let code = status.as_u16();
            return match code {
                401 | 403 => EmbedError::Unauthorized { status: code },
                429 => EmbedError::RateLimited {
                    retry_after_secs: None,
                },
                500..=599 => EmbedError::Server {
                    status: code,
                    snippet: String::new(),
                },
                _ => EmbedError::HttpStatus {
                    status: code,
                    snippet: String::new(),
                },
            };
        }
        EmbedError::Network(e.to_string())
    }
}
