//! File-backed vector store.
//!
//! Collections live in memory behind a `tokio::sync::RwLock` and are
//! persisted as one JSON file per collection under a data directory. Every
//! persisted write lands in a temp file first and is published with an atomic
//! rename, so a crash mid-rebuild leaves each collection file either fully
//! old or fully new, and the directory is never deleted out from under a
//! reader.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::point::{Point, SearchHit};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] persisted to a local directory.
pub struct LocalVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, HashMap<String, Point>>>,
}

impl LocalVectorStore {
    /// Open a store at `dir`, creating the directory if needed and loading
    /// every collection file already present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Self::store_err(format!("cannot create '{}': {e}", dir.display())))?;

        let mut collections = HashMap::new();
        let entries = fs::read_dir(&dir)
            .map_err(|e| Self::store_err(format!("cannot read '{}': {e}", dir.display())))?;
        for entry in entries {
            let path = entry
                .map_err(|e| Self::store_err(format!("cannot scan '{}': {e}", dir.display())))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = fs::read(&path)
                .map_err(|e| Self::store_err(format!("cannot read '{}': {e}", path.display())))?;
            let points: Vec<Point> = serde_json::from_slice(&body).map_err(|e| {
                Self::store_err(format!("corrupt collection file '{}': {e}", path.display()))
            })?;
            collections.insert(
                name.to_string(),
                points.into_iter().map(|p| (p.id.clone(), p)).collect(),
            );
        }

        debug!(dir = %dir.display(), collections = collections.len(), "opened local vector store");
        Ok(Self { dir, collections: RwLock::new(collections) })
    }

    fn store_err(message: impl Into<String>) -> SearchError {
        SearchError::VectorStore { backend: "local".to_string(), message: message.into() }
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write a collection file via temp file + atomic rename.
    fn persist(&self, name: &str, points: &HashMap<String, Point>) -> Result<()> {
        let all: Vec<&Point> = points.values().collect();
        let body = serde_json::to_vec(&all)
            .map_err(|e| Self::store_err(format!("cannot serialize '{name}': {e}")))?;

        let tmp = self.dir.join(format!("{name}.json.tmp"));
        fs::write(&tmp, body)
            .map_err(|e| Self::store_err(format!("cannot write '{}': {e}", tmp.display())))?;
        fs::rename(&tmp, self.collection_path(name))
            .map_err(|e| Self::store_err(format!("cannot publish '{name}': {e}")))?;
        Ok(())
    }
}

/// Cosine similarity of two vectors; 0.0 if either has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        let points = collections.entry(name.to_string()).or_default();
        self.persist(name, points)?;
        debug!(collection = name, "created collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        match fs::remove_file(self.collection_path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Self::store_err(format!("cannot delete '{name}': {e}"))),
        }
        debug!(collection = name, "deleted collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let mut collections = self.collections.write().await;
        let stored = collections.get_mut(collection).ok_or_else(|| {
            Self::store_err(format!("collection '{collection}' does not exist"))
        })?;
        for point in points {
            stored.insert(point.id.clone(), point.clone());
        }
        self.persist(collection, stored)
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let collections = self.collections.read().await;
        let stored = collections.get(collection).ok_or_else(|| {
            Self::store_err(format!("collection '{collection}' does not exist"))
        })?;

        let mut hits: Vec<SearchHit> = stored
            .values()
            .map(|point| SearchHit {
                id: point.id.clone(),
                payload: point.payload.clone(),
                score: cosine_similarity(&point.embedding, embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let stored = collections.get(collection).ok_or_else(|| {
            Self::store_err(format!("collection '{collection}' does not exist"))
        })?;
        Ok(stored.len())
    }
}
