//! Handler for the in-memory backup snapshot.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;

use atmfleet_core::audit::AuditAction;
use atmfleet_core::deadline::with_deadline;
use atmfleet_core::value::{serialize_row, BinaryMode};
use atmfleet_db::audit::AuditLogRepo;
use atmfleet_db::catalog::{self, ColumnDescriptor};
use atmfleet_db::tableops;

use crate::error::{AppError, AppResult};
use crate::handlers::{audit_success, CATALOG_DEADLINE};
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::state::AppState;

/// Per-table cap: tables above this row count are recorded but not copied,
/// bounding both memory and response time for the single-request snapshot.
pub const BACKUP_ROW_CAP: i64 = 10_000;

/// One table's slice of the snapshot.
#[derive(Debug, Serialize)]
pub struct TableBackup {
    pub schema: Vec<ColumnDescriptor>,
    pub data: Vec<Vec<serde_json::Value>>,
    pub row_count: i64,
    pub backed_up_rows: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The whole snapshot. Constructed entirely in memory and streamed out;
/// never stored server-side.
#[derive(Debug, Serialize)]
pub struct BackupSnapshot {
    pub timestamp: String,
    pub tables: BTreeMap<String, TableBackup>,
}

/// POST /database/backup
///
/// Walk every base table: schema plus up to [`BACKUP_ROW_CAP`] rows in
/// full-fidelity (base64) mode. A table that is empty or over the cap is
/// recorded with `backed_up_rows = 0` and empty data; a table that fails
/// carries its error inside its own entry. One table can never abort the
/// snapshot.
pub async fn backup(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
) -> AppResult<impl IntoResponse> {
    let names = with_deadline(CATALOG_DEADLINE, catalog::list_table_names(&state.pool))
        .await
        .map_err(AppError::Core)?;

    let total_tables = names.len();
    let mut successful_tables = 0usize;
    let mut tables = BTreeMap::new();

    for (name, _) in names {
        let entry = backup_one_table(&state, &name).await;
        if entry.error.is_none() {
            successful_tables += 1;
        }
        tables.insert(name, entry);
    }

    let snapshot = BackupSnapshot {
        timestamp: chrono::Utc::now().to_rfc3339(),
        tables,
    };

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::Backup, None, &user, &meta)
            .with_details(format!("{successful_tables}/{total_tables} tables")),
    )
    .await;

    let filename = format!(
        "backup_{}.json",
        chrono::Utc::now().format("%Y-%m-%d_%H%M%S")
    );
    let body = serde_json::to_string(&snapshot)
        .map_err(|e| AppError::InternalError(format!("Snapshot serialization failed: {e}")))?;

    Ok(axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(body))
        .unwrap()
        .into_response())
}

/// Snapshot one table, capturing any failure inside the entry itself.
async fn backup_one_table(state: &AppState, table: &str) -> TableBackup {
    let schema = match catalog::columns(&state.pool, table).await {
        Ok(columns) => columns,
        Err(e) => {
            return TableBackup {
                schema: Vec::new(),
                data: Vec::new(),
                row_count: 0,
                backed_up_rows: 0,
                error: Some(e.to_string()),
            }
        }
    };

    let row_count = match catalog::row_count(&state.pool, table).await {
        Ok(count) => count,
        Err(e) => {
            return TableBackup {
                schema,
                data: Vec::new(),
                row_count: 0,
                backed_up_rows: 0,
                error: Some(e.to_string()),
            }
        }
    };

    // Empty or over-cap: keep the schema, skip the data.
    if row_count == 0 || row_count > BACKUP_ROW_CAP {
        return TableBackup {
            schema,
            data: Vec::new(),
            row_count,
            backed_up_rows: 0,
            error: None,
        };
    }

    match tableops::fetch_all_rows(&state.pool, table).await {
        Ok(rows) => {
            let backed_up_rows = rows.len() as i64;
            TableBackup {
                schema,
                data: rows
                    .iter()
                    .map(|row| serialize_row(row, BinaryMode::Base64))
                    .collect(),
                row_count,
                backed_up_rows,
                error: None,
            }
        }
        Err(e) => TableBackup {
            schema,
            data: Vec::new(),
            row_count,
            backed_up_rows: 0,
            error: Some(e.to_string()),
        },
    }
}
