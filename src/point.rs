//! Data types stored in and returned by the vector index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The unit stored in a vector collection: an id, an embedding, and an
/// arbitrary JSON payload carried back verbatim in search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Point {
    /// Unique identifier within the collection. Upserting the same id
    /// replaces the stored point.
    pub id: String,
    /// The embedding vector. Its length must match the collection dimension.
    pub embedding: Vec<f32>,
    /// Key-value document attached to the point.
    pub payload: Map<String, Value>,
}

/// A retrieved [`Point`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Id of the matched point.
    pub id: String,
    /// Payload of the matched point.
    pub payload: Map<String, Value>,
    /// Cosine similarity to the query vector (higher is more similar).
    pub score: f32,
}
