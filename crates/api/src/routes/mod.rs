pub mod database;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /database/...    database administration (requires `manage-database`)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/database", database::router())
}
