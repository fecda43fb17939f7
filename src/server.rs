//! HTTP surface: axum router and handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::error::{Result, SearchError};
use crate::pipeline::SearchPipeline;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<SearchPipeline>,
}

impl AppState {
    /// Wrap a pipeline for serving.
    pub fn new(pipeline: Arc<SearchPipeline>) -> Self {
        Self { pipeline }
    }
}

/// Build the service router.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/hello", get(hello))
        .route("/update", get(update))
        .route("/search", get(search))
        .with_state(state)
        .layer(cors)
}

/// Bind and serve using the pipeline's configured host and port.
pub async fn run_server(pipeline: Arc<SearchPipeline>) -> Result<()> {
    let config = pipeline.config();
    let addr = format!("{}:{}", config.host, config.port);
    let app = app_router(AppState::new(pipeline.clone()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("semsearch listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

/// A [`SearchError`] rendered as a JSON error response.
struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SearchError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({"error": self.0.to_string()}))).into_response()
    }
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../static/index.html"))
}

async fn hello() -> impl IntoResponse {
    Html("<p>Hello from the server!</p>")
}

async fn update(State(state): State<AppState>) -> std::result::Result<Json<Value>, ApiError> {
    info!("update requested");
    let report = state.pipeline.ingest().await?;
    info!(
        points = report.points_written,
        skipped = report.rows_skipped,
        "update complete"
    );
    Ok(Json(json!({"message": "Data updated successfully"})))
}

#[derive(Serialize)]
struct SearchResponseItem {
    id: String,
    metadata: Map<String, Value>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> std::result::Result<Json<Vec<SearchResponseItem>>, ApiError> {
    let fields = &state.pipeline.config().indexed_fields;
    let (field, text) = resolve_query(fields, &params)?;

    let hits = state.pipeline.query(&field, &text).await?;
    let items = hits
        .into_iter()
        .map(|hit| SearchResponseItem { id: hit.id, metadata: hit.payload })
        .collect();
    Ok(Json(items))
}

/// Pick the collection and query text out of the request parameters.
///
/// Single-field deployments accept `q` (or the field's own name); multi-field
/// deployments require a parameter named after a configured field. The error
/// messages are part of the HTTP contract.
fn resolve_query(
    fields: &[String],
    params: &HashMap<String, String>,
) -> std::result::Result<(String, String), SearchError> {
    if let [field] = fields {
        return match params.get("q").or_else(|| params.get(field)) {
            Some(text) if !text.trim().is_empty() => Ok((field.clone(), text.clone())),
            _ => Err(SearchError::InvalidQuery("Query parameter 'q' is required".to_string())),
        };
    }

    fields
        .iter()
        .find_map(|field| params.get(field).map(|text| (field.clone(), text.clone())))
        .ok_or_else(|| SearchError::InvalidQuery("query parameter is wrong".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn single_field_accepts_q() {
        let (field, text) =
            resolve_query(&fields(&["METADATA"]), &params(&[("q", "printer down")])).unwrap();
        assert_eq!(field, "METADATA");
        assert_eq!(text, "printer down");
    }

    #[test]
    fn single_field_accepts_field_name() {
        let (field, _) =
            resolve_query(&fields(&["METADATA"]), &params(&[("METADATA", "x")])).unwrap();
        assert_eq!(field, "METADATA");
    }

    #[test]
    fn single_field_requires_q() {
        let err = resolve_query(&fields(&["METADATA"]), &params(&[])).unwrap_err();
        assert_eq!(err.to_string(), "Query parameter 'q' is required");
    }

    #[test]
    fn single_field_rejects_blank_q() {
        let err = resolve_query(&fields(&["METADATA"]), &params(&[("q", "  ")])).unwrap_err();
        assert_eq!(err.to_string(), "Query parameter 'q' is required");
    }

    #[test]
    fn multi_field_selects_matching_parameter() {
        let (field, text) = resolve_query(
            &fields(&["Notes", "Summary"]),
            &params(&[("Summary", "outage")]),
        )
        .unwrap();
        assert_eq!(field, "Summary");
        assert_eq!(text, "outage");
    }

    #[test]
    fn multi_field_rejects_unknown_parameter() {
        let err =
            resolve_query(&fields(&["Notes", "Summary"]), &params(&[("bogus", "x")])).unwrap_err();
        assert_eq!(err.to_string(), "query parameter is wrong");
    }
}
