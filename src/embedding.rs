//! Embedding provider trait.

use async_trait::async_trait;

use crate::error::Result;

/// Maps text to a fixed-dimension vector by calling an embedding backend.
///
/// Callers must not pass empty text; the workflows reject it before reaching
/// a provider. Remote failures are propagated unmodified, with no retry at
/// this layer.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding vector for one text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially; backends with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of vectors produced by this provider.
    fn dimensions(&self) -> usize;
}
