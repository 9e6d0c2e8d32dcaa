use crate::{EmbedError, EmbedFuture, EmbeddingsProvider};

/// Provider stand-in that always fails with [`EmbedError::NotConfigured`].
///
/// Lets plumbing be exercised without a real embedding backend; any path
/// that actually needs a vector surfaces a clear error instead of silently
/// producing zeros.
#[derive(Clone, Debug)]
pub struct NoopEmbedder {
    dimension: usize,
}

impl NoopEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingsProvider for NoopEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async { Err(EmbedError::NotConfigured) })
    }

    fn embed_batch<'a>(&'a self, _texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async { Err(EmbedError::NotConfigured) })
    }
}
