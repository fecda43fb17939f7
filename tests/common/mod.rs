//! Shared fakes for integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use semsearch::dataset::{Record, RecordSource};
use semsearch::embedding::EmbeddingProvider;
use semsearch::error::{Result, SearchError};
use uuid::Uuid;

pub const FAKE_DIMENSIONS: usize = 16;

/// Deterministic text-dependent vector: the same text always embeds to the
/// same vector, so an exact-text query is its own nearest neighbor.
pub fn deterministic_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish() | 1;
    (0..dimensions)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) - 0.5
        })
        .collect()
}

/// An [`EmbeddingProvider`] that never leaves the process and counts calls.
#[derive(Clone, Default)]
pub struct FakeEmbedding {
    calls: Arc<AtomicUsize>,
}

impl FakeEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of embed calls that reached this provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(deterministic_embedding(text, FAKE_DIMENSIONS))
    }

    fn dimensions(&self) -> usize {
        FAKE_DIMENSIONS
    }
}

/// A [`RecordSource`] over a fixed in-memory record list.
pub struct StaticDataset {
    records: Vec<Record>,
}

impl StaticDataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticDataset {
    fn load(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}

/// Yields the same rows with fresh UUIDs on every load, like a dataset with
/// no natural key column.
pub struct GeneratedIdDataset {
    rows: Vec<BTreeMap<String, String>>,
}

impl GeneratedIdDataset {
    pub fn new(rows: &[&[(&str, &str)]]) -> Self {
        let rows = rows
            .iter()
            .map(|pairs| {
                pairs.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect()
            })
            .collect();
        Self { rows }
    }
}

impl RecordSource for GeneratedIdDataset {
    fn load(&self) -> Result<Vec<Record>> {
        Ok(self
            .rows
            .iter()
            .map(|values| Record { id: Uuid::new_v4().to_string(), values: values.clone() })
            .collect())
    }
}

/// A [`RecordSource`] that always fails, standing in for a missing dataset.
pub struct FailingDataset;

impl RecordSource for FailingDataset {
    fn load(&self) -> Result<Vec<Record>> {
        Err(SearchError::Dataset("cannot open 'input.xlsx': file not found".to_string()))
    }
}

/// Build a record from field name/value pairs.
pub fn record(id: &str, pairs: &[(&str, &str)]) -> Record {
    let values: BTreeMap<String, String> =
        pairs.iter().map(|(name, value)| (name.to_string(), value.to_string())).collect();
    Record { id: id.to_string(), values }
}
