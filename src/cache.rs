//! Memoizing decorator for embedding providers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;

/// Caches embeddings by exact input text in front of another provider.
///
/// The cache is process-scoped: never persisted, never invalidated, and
/// unbounded. A hit returns the stored vector without an upstream call, so
/// ingesting datasets with repeated cell values (and re-querying the same
/// text) costs one API call per distinct string.
pub struct CachedEmbedding<P> {
    inner: P,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl<P: EmbeddingProvider> CachedEmbedding<P> {
    /// Wrap a provider with an empty cache.
    pub fn new(inner: P) -> Self {
        Self { inner, cache: Mutex::new(HashMap::new()) }
    }

    /// Number of distinct texts currently cached.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedding<P> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.cache.lock().await.get(text) {
            debug!(text_len = text.len(), "embedding cache hit");
            return Ok(hit.clone());
        }

        let embedding = self.inner.embed(text).await?;
        self.cache.lock().await.insert(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
