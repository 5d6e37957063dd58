use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, built once at startup and injected here.
    pub pool: atmfleet_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
