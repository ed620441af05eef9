use std::sync::Arc;

use taskforge_import::store::ImportStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Backing store for the import pipeline. Production wires up
    /// `taskforge_db::PgStore`; tests swap in the in-memory store.
    pub store: Arc<dyn ImportStore>,
}
