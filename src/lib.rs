//! `semsearch` ingests spreadsheet rows into per-field vector collections and
//! serves nearest-neighbor search over HTTP.
//!
//! The library is organized around two seams: [`EmbeddingProvider`] wraps the
//! remote text-to-vector API, and [`VectorStore`] wraps the index backend.
//! [`SearchPipeline`] composes them with a dataset source and drives the two
//! workflows (full rebuild ingestion and top-k query) that the axum server
//! in [`server`] exposes.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod local;
pub mod openai;
pub mod pipeline;
pub mod point;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod server;
pub mod vectorstore;

pub use cache::CachedEmbedding;
pub use config::{PayloadMode, ServiceConfig};
pub use dataset::{DatasetSchema, Record, RecordSource, XlsxDataset};
pub use embedding::EmbeddingProvider;
pub use error::{Result, SearchError};
pub use local::LocalVectorStore;
pub use openai::OpenAiEmbedding;
pub use pipeline::{IngestReport, SearchPipeline};
pub use point::{Point, SearchHit};
pub use server::{AppState, app_router, run_server};
pub use vectorstore::VectorStore;
