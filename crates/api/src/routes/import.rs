//! Route definitions for the CSV bulk import pipeline.
//!
//! Mounted at `/import` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Import routes.
///
/// ```text
/// POST   /validate              -> validate_csv
/// GET    /jobs                  -> list_jobs (?limit, offset)
/// POST   /jobs                  -> create_job
/// GET    /jobs/{id}             -> get_job
/// POST   /jobs/{id}/start       -> start_job
/// ```
pub fn import_router() -> Router<AppState> {
    Router::new()
        .route("/validate", post(import::validate_csv))
        .route("/jobs", get(import::list_jobs).post(import::create_job))
        .route("/jobs/{id}", get(import::get_job))
        .route("/jobs/{id}/start", post(import::start_job))
}
