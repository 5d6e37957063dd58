//! Handlers for table listing, analysis, browsing, and deletion.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use atmfleet_core::audit::AuditAction;
use atmfleet_core::deadline::with_deadline;
use atmfleet_core::error::CoreError;
use atmfleet_core::ident::validate_identifier;
use atmfleet_core::registry::{classify_table, is_protected, TableClass};
use atmfleet_core::value::{serialize_row, BinaryMode};
use atmfleet_db::audit::AuditLogRepo;
use atmfleet_db::catalog::{self, ColumnDescriptor, TableDescriptor};
use atmfleet_db::tableops;

use crate::error::{AppError, AppResult};
use crate::handlers::{audit_failure, audit_success, CATALOG_DEADLINE};
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Aggregate totals for the analysis endpoint.
#[derive(Debug, Serialize)]
pub struct AnalyzeStatistics {
    pub total_rows: i64,
    pub unused_rows: i64,
    pub used_count: usize,
    pub unused_count: usize,
    pub protected_count: usize,
}

/// Response for `GET /database/analyze-tables`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub total_tables: usize,
    pub used_tables: Vec<TableDescriptor>,
    /// Sorted descending by approximate size so the highest-value cleanup
    /// candidates surface first.
    pub unused_tables: Vec<TableDescriptor>,
    pub protected_tables: Vec<TableDescriptor>,
    pub statistics: AnalyzeStatistics,
}

/// One table with its embedded columns, for the simple listing.
#[derive(Debug, Serialize)]
pub struct TableWithColumns {
    #[serde(flatten)]
    pub table: TableDescriptor,
    pub columns: Vec<ColumnDescriptor>,
}

/// Response for `GET /database/table-data`.
#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub columns: Vec<ColumnDescriptor>,
    pub data: Vec<Vec<serde_json::Value>>,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Analyze tables
// ---------------------------------------------------------------------------

/// GET /database/analyze-tables
///
/// Classify every base table against the static allow/protected lists and
/// aggregate totals. Per-table introspection failures are attached to the
/// affected descriptor; the analysis itself always completes.
pub async fn analyze_tables(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
) -> AppResult<impl IntoResponse> {
    let names = with_deadline(CATALOG_DEADLINE, catalog::list_table_names(&state.pool))
        .await
        .map_err(AppError::Core)?;

    let mut used_tables = Vec::new();
    let mut unused_tables = Vec::new();
    let mut protected_tables = Vec::new();
    let mut total_rows: i64 = 0;
    let mut unused_rows: i64 = 0;

    for (name, column_count) in names {
        let descriptor = catalog::annotate_table(&state.pool, name, column_count).await;
        total_rows += descriptor.row_count;
        match classify_table(&descriptor.name) {
            TableClass::Protected => protected_tables.push(descriptor),
            TableClass::Used => used_tables.push(descriptor),
            TableClass::Unused => {
                unused_rows += descriptor.row_count;
                unused_tables.push(descriptor);
            }
        }
    }

    // Largest cleanup candidates first.
    unused_tables.sort_by(|a, b| {
        b.approx_size_kb
            .partial_cmp(&a.approx_size_kb)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let response = AnalyzeResponse {
        total_tables: used_tables.len() + unused_tables.len() + protected_tables.len(),
        statistics: AnalyzeStatistics {
            total_rows,
            unused_rows,
            used_count: used_tables.len(),
            unused_count: unused_tables.len(),
            protected_count: protected_tables.len(),
        },
        used_tables,
        unused_tables,
        protected_tables,
    };

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::View, None, &user, &meta).with_details("analyze-tables"),
    )
    .await;

    Ok(Json(DataResponse { data: response }))
}

// ---------------------------------------------------------------------------
// List tables (simple)
// ---------------------------------------------------------------------------

/// GET /database/tables
///
/// Every base table with its columns embedded. A table whose column read
/// fails is listed with empty columns and the error on the descriptor.
pub async fn list_tables(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
) -> AppResult<impl IntoResponse> {
    let names = with_deadline(CATALOG_DEADLINE, catalog::list_table_names(&state.pool))
        .await
        .map_err(AppError::Core)?;

    let mut tables = Vec::with_capacity(names.len());
    for (name, column_count) in names {
        let mut table = catalog::annotate_table(&state.pool, name, column_count).await;
        let columns = match catalog::columns(&state.pool, &table.name).await {
            Ok(columns) => columns,
            Err(e) => {
                table.error.get_or_insert_with(|| e.to_string());
                Vec::new()
            }
        };
        tables.push(TableWithColumns { table, columns });
    }

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::View, None, &user, &meta).with_details("list-tables"),
    )
    .await;

    Ok(Json(DataResponse { data: tables }))
}

// ---------------------------------------------------------------------------
// Browse table data
// ---------------------------------------------------------------------------

/// Query parameters for the browse endpoint.
#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub table: String,
    pub limit: Option<i64>,
}

/// Default and maximum row limits for interactive browsing.
const BROWSE_DEFAULT_LIMIT: i64 = 100;
const BROWSE_MAX_LIMIT: i64 = 1_000;

/// GET /database/table-data?table=&limit=
///
/// At most `limit` rows in the store's natural order, binary columns
/// rendered as placeholders. Browsing is high-frequency and low-risk, so
/// the success-path audit write is detached from the response; a failed
/// browse still writes its entry synchronously.
pub async fn table_data(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    Query(params): Query<BrowseParams>,
) -> AppResult<impl IntoResponse> {
    let table = validate_identifier(&params.table)
        .map_err(AppError::Core)?
        .to_string();
    let limit = params
        .limit
        .unwrap_or(BROWSE_DEFAULT_LIMIT)
        .clamp(1, BROWSE_MAX_LIMIT);

    // A browse that dies in the catalog is still an attempt on record.
    let columns = match catalog::columns(&state.pool, &table).await {
        Ok(columns) => columns,
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::View, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            return Err(AppError::Database(e));
        }
    };
    if columns.is_empty() {
        let message = format!("table '{table}' not found");
        AuditLogRepo::record_best_effort(
            &state.pool,
            audit_failure(AuditAction::View, Some(&table), &user, &meta, &message),
        )
        .await;
        return Err(AppError::Core(CoreError::NotFound {
            entity: "table",
            name: table,
        }));
    }

    let fetched = tableops::fetch_rows(&state.pool, &table, limit).await;

    match fetched {
        Ok(rows) => {
            let total = catalog::row_count(&state.pool, &table).await.unwrap_or(0);
            let data = rows
                .iter()
                .map(|row| serialize_row(row, BinaryMode::Placeholder))
                .collect();

            // Fire-and-forget: the response does not wait for the audit
            // write, and the write's own failure stays on its channel.
            let pool = state.pool.clone();
            let entry = audit_success(AuditAction::View, Some(&table), &user, &meta)
                .with_details(format!("browse limit={limit}"));
            tokio::spawn(async move {
                AuditLogRepo::record_best_effort(&pool, entry).await;
            });

            Ok(Json(DataResponse {
                data: BrowseResponse {
                    columns,
                    data,
                    total,
                },
            }))
        }
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::View, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            Err(AppError::Database(e))
        }
    }
}

// ---------------------------------------------------------------------------
// Delete table
// ---------------------------------------------------------------------------

/// Request body for table deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteTableRequest {
    pub table: String,
}

/// Response for table deletion.
#[derive(Debug, Serialize)]
pub struct DeleteTableResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /database/delete-table
///
/// Identifier-validated `DROP TABLE`. The protected list is a second,
/// unconditional gate beneath the capability check: protected tables are
/// refused regardless of who asks.
pub async fn delete_table(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    Json(body): Json<DeleteTableRequest>,
) -> AppResult<impl IntoResponse> {
    let table = validate_identifier(&body.table)
        .map_err(AppError::Core)?
        .to_string();

    if is_protected(&table) {
        let message = format!("Table '{table}' is protected and cannot be dropped");
        AuditLogRepo::record_best_effort(
            &state.pool,
            audit_failure(AuditAction::Delete, Some(&table), &user, &meta, &message),
        )
        .await;
        return Err(AppError::Core(CoreError::Forbidden(message)));
    }

    match tableops::drop_table(&state.pool, &table).await {
        Ok(()) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_success(AuditAction::Delete, Some(&table), &user, &meta),
            )
            .await;
            Ok(Json(DataResponse {
                data: DeleteTableResponse {
                    success: true,
                    message: format!("Table '{table}' dropped"),
                },
            }))
        }
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Delete, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            Err(AppError::Database(e))
        }
    }
}
