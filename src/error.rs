//! Error types for the `semsearch` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or searching.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The embedding API call failed or returned an unusable response.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store backend rejected or failed an operation.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The source dataset is missing, unreadable, or does not match the schema.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The search request is missing or names an unknown query parameter.
    ///
    /// The message is returned verbatim in the HTTP 400 body.
    #[error("{0}")]
    InvalidQuery(String),

    /// An I/O failure outside the dataset or store backends.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for crate operations.
pub type Result<T> = std::result::Result<T, SearchError>;
