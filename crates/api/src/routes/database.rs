//! Route definitions for the database administration surface.
//!
//! Mounted at `/database` by `api_routes()`. Every handler behind this
//! router requires the `manage-database` capability.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::{audit, backup, encoding, query, tables, transfer};
use crate::state::AppState;

/// Database administration routes.
///
/// ```text
/// GET    /analyze-tables              -> analyze_tables
/// GET    /tables                      -> list_tables
/// GET    /table-data                  -> table_data (?table, ?limit)
/// GET    /export                      -> export_table (?table)
/// POST   /import                      -> import_table (multipart)
/// POST   /query                       -> raw_query
/// DELETE /delete-table                -> delete_table (?table)
/// POST   /backup                      -> backup
/// GET    /check-encoding              -> check_encoding
/// POST   /fix-encoding-after-restore  -> fix_encoding
/// GET    /audit-logs                  -> query_audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze-tables", get(tables::analyze_tables))
        .route("/tables", get(tables::list_tables))
        .route("/table-data", get(tables::table_data))
        .route("/export", get(transfer::export_table))
        .route("/import", post(transfer::import_table))
        .route("/query", post(query::raw_query))
        .route("/delete-table", delete(tables::delete_table))
        .route("/backup", post(backup::backup))
        .route("/check-encoding", get(encoding::check_encoding))
        .route(
            "/fix-encoding-after-restore",
            post(encoding::fix_encoding),
        )
        .route("/audit-logs", get(audit::query_audit_logs))
}
