use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// What `GET /health` reports.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Version of this crate, for correlating deploys with behaviour.
    pub version: &'static str,
}

/// GET /health -- liveness probe. No store access; a healthy process
/// answers even when PostgreSQL is down.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes, mounted at the root rather than under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
