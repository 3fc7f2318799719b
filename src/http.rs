//! HTTP API
//!
//! `POST /merge` and `POST /split` accept the JSON payloads defined in
//! `service`; stored outputs are served under `/files` by `serve`.

use crate::error::SpliceError;
use crate::service::{MergeRequest, MergeResponse, SplitRequest, SplitResponse, Toolkit};
use crate::store::BlobStore;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

impl IntoResponse for SpliceError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!("Rejected request: {}", self);
            let body = Json(json!({ "message": self.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        error!("Request failed: {}", self);
        let body = Json(json!({
            "message": "Internal server error",
            "error": self.to_string(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub fn router<S: BlobStore>(toolkit: Arc<Toolkit<S>>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/merge", post(merge::<S>))
        .route("/split", post(split::<S>))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(toolkit)
}

async fn health() -> &'static str {
    "OK"
}

async fn merge<S: BlobStore>(
    State(toolkit): State<Arc<Toolkit<S>>>,
    body: Bytes,
) -> Result<Json<MergeResponse>, SpliceError> {
    let request: MergeRequest = parse_body(&body)?;
    Ok(Json(toolkit.merge(request).await?))
}

async fn split<S: BlobStore>(
    State(toolkit): State<Arc<Toolkit<S>>>,
    body: Bytes,
) -> Result<Json<SplitResponse>, SpliceError> {
    let request: SplitRequest = parse_body(&body)?;
    Ok(Json(toolkit.split(request).await?))
}

/// Malformed JSON is the caller's fault, so it maps to 400 rather than
/// the extractor's default rejection.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, SpliceError> {
    serde_json::from_slice(body).map_err(|e| SpliceError::InvalidPayload(e.to_string()))
}
