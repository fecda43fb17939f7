//! Ingestion and query workflows.
//!
//! [`SearchPipeline`] is the explicitly constructed service context: the
//! configuration, the embedding provider, the vector store, and the dataset
//! source, composed once at startup and shared by every request. It owns the
//! operations lock that keeps queries out while a rebuild is in flight.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::config::{PayloadMode, ServiceConfig};
use crate::dataset::{Record, RecordSource};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, SearchError};
use crate::point::{Point, SearchHit};
use crate::vectorstore::VectorStore;

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Points written across all collections.
    pub points_written: usize,
    /// (record, field) pairs skipped for empty ids or values.
    pub rows_skipped: usize,
}

/// The ingestion and query workflows over one store instance.
///
/// Construct via [`SearchPipeline::builder()`].
pub struct SearchPipeline {
    config: ServiceConfig,
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    dataset: Arc<dyn RecordSource>,
    /// Rebuilds take the write half, queries the read half. The store is a
    /// shared mutable resource with no concurrency guarantees of its own, so
    /// all operations against it are serialized here.
    ops: RwLock<()>,
}

impl SearchPipeline {
    /// Create a new [`SearchPipelineBuilder`].
    pub fn builder() -> SearchPipelineBuilder {
        SearchPipelineBuilder::default()
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Rebuild every collection from the dataset.
    ///
    /// Each configured field's collection is deleted and recreated, then every
    /// record is embedded and upserted. Rows with an empty id or field value
    /// are skipped with a warning; dataset and upstream failures abort the
    /// remaining run. Partial writes before an abort are not rolled back.
    pub async fn ingest(&self) -> Result<IngestReport> {
        let _guard = self.ops.write().await;

        for field in &self.config.indexed_fields {
            self.store.delete_collection(field).await?;
            self.store.create_collection(field, self.config.dimensions).await?;
        }

        let records = self.dataset.load()?;

        let mut points_written = 0;
        let mut rows_skipped = 0;
        for (row, record) in records.iter().enumerate() {
            for field in &self.config.indexed_fields {
                if record.id.is_empty() {
                    warn!(row, field = %field, "skipping row with empty id");
                    rows_skipped += 1;
                    continue;
                }
                let Some(text) = record.field(field) else {
                    warn!(row, field = %field, "skipping row with empty field value");
                    rows_skipped += 1;
                    continue;
                };

                let embedding = self.provider.embed(text).await.inspect_err(|e| {
                    error!(row, field = %field, error = %e, "embedding failed, aborting ingestion");
                })?;
                let point = Point {
                    id: record.id.clone(),
                    embedding,
                    payload: self.payload_for(record, text),
                };
                self.store.upsert(field, std::slice::from_ref(&point)).await.inspect_err(
                    |e| error!(row, field = %field, error = %e, "upsert failed, aborting ingestion"),
                )?;

                debug!(row, field = %field, text = %truncated(text, 30), "upserted point");
                points_written += 1;
            }
        }

        info!(points_written, rows_skipped, "ingestion complete");
        Ok(IngestReport { points_written, rows_skipped })
    }

    /// Search one field's collection for the nearest points to `text`.
    ///
    /// Validation failures (unknown field, empty text) are reported before
    /// any upstream call is made.
    pub async fn query(&self, field: &str, text: &str) -> Result<Vec<SearchHit>> {
        if !self.config.indexed_fields.iter().any(|f| f == field) {
            return Err(SearchError::InvalidQuery(format!("unknown search field '{field}'")));
        }
        if text.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query text must not be empty".to_string()));
        }

        let _guard = self.ops.read().await;

        let embedding = self.provider.embed(text).await.inspect_err(|e| {
            error!(field, text = %truncated(text, 30), error = %e, "query embedding failed");
        })?;
        let hits = self.store.search(field, &embedding, self.config.top_k).await.inspect_err(
            |e| error!(field, error = %e, "vector store search failed"),
        )?;

        info!(field, results = hits.len(), "search completed");
        Ok(hits)
    }

    fn payload_for(&self, record: &Record, text: &str) -> Map<String, Value> {
        match self.config.payload_mode {
            PayloadMode::FieldText => {
                let mut payload = Map::new();
                payload.insert("data".to_string(), Value::String(text.to_string()));
                payload
            }
            PayloadMode::FullRecord => record
                .values
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect(),
        }
    }
}

/// First `max` characters of `text`, for log fields.
fn truncated(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Builder for constructing a [`SearchPipeline`].
#[derive(Default)]
pub struct SearchPipelineBuilder {
    config: Option<ServiceConfig>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    dataset: Option<Arc<dyn RecordSource>>,
}

impl SearchPipelineBuilder {
    /// Set the service configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the dataset source.
    pub fn dataset(mut self, dataset: Arc<dyn RecordSource>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Build the [`SearchPipeline`], validating that all parts are set.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if any required part is missing.
    pub fn build(self) -> Result<SearchPipeline> {
        let config =
            self.config.ok_or_else(|| SearchError::Config("config is required".to_string()))?;
        let provider =
            self.provider.ok_or_else(|| SearchError::Config("provider is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| SearchError::Config("store is required".to_string()))?;
        let dataset =
            self.dataset.ok_or_else(|| SearchError::Config("dataset is required".to_string()))?;

        Ok(SearchPipeline { config, provider, store, dataset, ops: RwLock::new(()) })
    }
}
