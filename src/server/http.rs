//! HTTP query API
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Rows matching every `column=value` query parameter |
//!
//! # Example
//!
//! ```bash
//! curl 'http://localhost:8080/?state=CA&year=2020'
//! ```
//!
//! Success is `200` with a JSON array of objects. Failures carry a JSON string
//! body: `400` for an empty filter, an unknown column, or a query the store
//! rejects; `500` when a result row cannot be read.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::AppContext;
use crate::error::QueryError;
use crate::query::{Filter, Record};

/// Shared state for the query API.
#[derive(Clone)]
pub struct QueryApiState {
    pub context: Arc<AppContext>,
}

/// Create the query API router.
pub fn create_query_router(context: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(query_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(QueryApiState { context })
}

/// Equality lookup handler.
///
/// Parameters are taken as an ordered list of pairs so repeated keys reach
/// the filter intact.
async fn query_handler(
    State(state): State<QueryApiState>,
    params: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let Query(pairs) = params.map_err(|e| {
        warn!(error = %e, "Malformed query string");
        ApiError::BadRequest(e.body_text())
    })?;

    let filter = Filter::from_pairs(pairs);
    let context = state.context.clone();
    let records = tokio::task::spawn_blocking(move || context.query(&filter))
        .await
        .map_err(|e| ApiError::Internal(format!("query task failed: {}", e)))?
        .map_err(|e| {
            warn!(error = %e, "Could not query for data");
            ApiError::from(e)
        })?;

    Ok(Json(records))
}

// ─── Error handling ──────────────────────────────────────────────────────────

/// API error type with HTTP status code mapping.
///
/// The body is the message as a JSON string.
#[derive(Debug)]
pub enum ApiError {
    /// The request cannot be answered as asked.
    BadRequest(String),
    /// The query ran but its result could not be produced.
    Internal(String),
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(message)).into_response()
    }
}
