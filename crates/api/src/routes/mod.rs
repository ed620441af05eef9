pub mod health;
pub mod import;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /import/validate                  validate CSV against a rule set (POST)
///
/// /import/jobs                      list jobs (?limit, offset), create job (GET, POST)
/// /import/jobs/{id}                 job with its error log (GET)
/// /import/jobs/{id}/start           begin the background import (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/import", import::import_router())
}
