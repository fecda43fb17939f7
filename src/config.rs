//! Service configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// What gets stored as a point's payload during ingestion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayloadMode {
    /// Only the indexed field's text, under a `data` key.
    FieldText,
    /// The whole row serialized as a key-value document.
    FullRecord,
}

/// Configuration for the ingestion and query workflows and the HTTP server.
///
/// Construct via [`ServiceConfig::builder()`] or [`ServiceConfig::from_env()`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Path of the spreadsheet ingested by every rebuild.
    pub dataset_path: PathBuf,
    /// Directory holding the local index files.
    pub data_dir: PathBuf,
    /// Column providing the record id. `None` generates a fresh UUID per row.
    pub id_column: Option<String>,
    /// Columns indexed for search; each maps to a collection of the same name.
    pub indexed_fields: Vec<String>,
    /// Embedding model name.
    pub model: String,
    /// Embedding dimensionality; must match the model's output size.
    pub dimensions: usize,
    /// Number of nearest neighbors returned per query.
    pub top_k: usize,
    /// Payload policy for ingested points.
    pub payload_mode: PayloadMode,
    /// Bind host for the HTTP server.
    pub host: String,
    /// Bind port for the HTTP server.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("input.xlsx"),
            data_dir: PathBuf::from("./qdrant_data"),
            id_column: Some("ID".to_string()),
            indexed_fields: vec!["METADATA".to_string()],
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            top_k: 20,
            payload_mode: PayloadMode::FullRecord,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServiceConfig {
    /// Create a new builder for constructing a [`ServiceConfig`].
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Build a configuration from `SEMSEARCH_*` environment variables,
    /// falling back to defaults for anything unset.
    ///
    /// Recognized variables: `SEMSEARCH_DATASET`, `SEMSEARCH_DATA_DIR`,
    /// `SEMSEARCH_ID_COLUMN` (empty disables the natural key),
    /// `SEMSEARCH_FIELDS` (comma-separated), `SEMSEARCH_MODEL`,
    /// `SEMSEARCH_DIMENSIONS`, `SEMSEARCH_TOP_K`, `SEMSEARCH_PAYLOAD`
    /// (`field` or `record`), `SEMSEARCH_HOST`, `SEMSEARCH_PORT`.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();

        if let Ok(path) = std::env::var("SEMSEARCH_DATASET") {
            builder = builder.dataset_path(path);
        }
        if let Ok(dir) = std::env::var("SEMSEARCH_DATA_DIR") {
            builder = builder.data_dir(dir);
        }
        if let Ok(column) = std::env::var("SEMSEARCH_ID_COLUMN") {
            let column = column.trim().to_string();
            builder =
                if column.is_empty() { builder.generated_ids() } else { builder.id_column(column) };
        }
        if let Ok(fields) = std::env::var("SEMSEARCH_FIELDS") {
            let fields: Vec<String> = fields
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            builder = builder.indexed_fields(fields);
        }
        if let Ok(model) = std::env::var("SEMSEARCH_MODEL") {
            builder = builder.model(model);
        }
        if let Ok(dims) = std::env::var("SEMSEARCH_DIMENSIONS") {
            let dims = dims.parse::<usize>().map_err(|_| {
                SearchError::Config(format!("SEMSEARCH_DIMENSIONS is not a number: {dims}"))
            })?;
            builder = builder.dimensions(dims);
        }
        if let Ok(top_k) = std::env::var("SEMSEARCH_TOP_K") {
            let top_k = top_k.parse::<usize>().map_err(|_| {
                SearchError::Config(format!("SEMSEARCH_TOP_K is not a number: {top_k}"))
            })?;
            builder = builder.top_k(top_k);
        }
        if let Ok(mode) = std::env::var("SEMSEARCH_PAYLOAD") {
            let mode = match mode.as_str() {
                "field" => PayloadMode::FieldText,
                "record" => PayloadMode::FullRecord,
                other => {
                    return Err(SearchError::Config(format!(
                        "SEMSEARCH_PAYLOAD must be 'field' or 'record', got '{other}'"
                    )));
                }
            };
            builder = builder.payload_mode(mode);
        }
        if let Ok(host) = std::env::var("SEMSEARCH_HOST") {
            builder = builder.host(host);
        }
        if let Ok(port) = std::env::var("SEMSEARCH_PORT") {
            let port = port
                .parse::<u16>()
                .map_err(|_| SearchError::Config(format!("SEMSEARCH_PORT is not a port: {port}")))?;
            builder = builder.port(port);
        }

        builder.build()
    }
}

/// Builder for constructing a validated [`ServiceConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Set the spreadsheet path.
    pub fn dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dataset_path = path.into();
        self
    }

    /// Set the local index directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Take record ids from the given column.
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.config.id_column = Some(column.into());
        self
    }

    /// Generate a fresh UUID per row instead of reading an id column.
    pub fn generated_ids(mut self) -> Self {
        self.config.id_column = None;
        self
    }

    /// Set the indexed field names.
    pub fn indexed_fields(mut self, fields: Vec<String>) -> Self {
        self.config.indexed_fields = fields;
        self
    }

    /// Set the embedding model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Set the number of results returned per query.
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.top_k = top_k;
        self
    }

    /// Set the payload policy.
    pub fn payload_mode(mut self, mode: PayloadMode) -> Self {
        self.config.payload_mode = mode;
        self
    }

    /// Set the HTTP bind host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the HTTP bind port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Build the [`ServiceConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if no indexed field is configured, a
    /// field name is duplicated or unusable as a collection name, or
    /// `dimensions`/`top_k` is zero.
    pub fn build(self) -> Result<ServiceConfig> {
        let config = self.config;
        if config.indexed_fields.is_empty() {
            return Err(SearchError::Config("at least one indexed field is required".to_string()));
        }
        for (i, field) in config.indexed_fields.iter().enumerate() {
            if field.is_empty() {
                return Err(SearchError::Config("indexed field names must not be empty".to_string()));
            }
            if field.contains('/') || field.contains('\\') {
                return Err(SearchError::Config(format!(
                    "indexed field name '{field}' must not contain path separators"
                )));
            }
            if config.indexed_fields[..i].contains(field) {
                return Err(SearchError::Config(format!("duplicate indexed field '{field}'")));
            }
        }
        if config.dimensions == 0 {
            return Err(SearchError::Config("dimensions must be greater than zero".to_string()));
        }
        if config.top_k == 0 {
            return Err(SearchError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(config)
    }
}
