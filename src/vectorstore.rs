//! Vector store trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::point::{Point, SearchHit};

/// A storage backend for named collections of embedded points with cosine
/// similarity search.
///
/// The ingestion workflow rebuilds a collection by deleting it and creating
/// it again, so `create_collection` may assume a fresh start. There is no
/// per-point delete: points are written during ingestion and only read
/// afterwards.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection for vectors of the given dimensionality.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and its storage. Succeeds if it does not exist.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Insert points, replacing any stored point with the same id.
    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()>;

    /// Return the `top_k` points most similar to `embedding`, best first.
    async fn search(&self, collection: &str, embedding: &[f32], top_k: usize)
    -> Result<Vec<SearchHit>>;

    /// Number of points stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}
