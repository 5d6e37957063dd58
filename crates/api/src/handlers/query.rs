//! Handler for audited raw statement execution.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use atmfleet_core::audit::AuditAction;
use atmfleet_core::guard::{audit_statement_prefix, check_raw_statement, is_select};
use atmfleet_core::value::{serialize_row, BinaryMode};
use atmfleet_db::audit::AuditLogRepo;
use atmfleet_db::tableops::{self, RawOutcome};

use crate::error::{AppError, AppResult};
use crate::handlers::{audit_failure, audit_success};
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for raw statement execution.
#[derive(Debug, Deserialize)]
pub struct RawQueryRequest {
    pub query: String,
}

/// Response for raw statement execution.
#[derive(Debug, Serialize)]
pub struct RawQueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Vec<serde_json::Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,
}

/// POST /database/query
///
/// Execute one statement. Multi-statement input and the catastrophic
/// keyword deny-list are rejected up front; everything else runs verbatim.
/// Every attempt -- including guard rejections -- writes one audit entry
/// carrying at most the first 200 characters of the statement.
pub async fn raw_query(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    Json(body): Json<RawQueryRequest>,
) -> AppResult<impl IntoResponse> {
    let prefix = audit_statement_prefix(body.query.trim());

    let stmt = match check_raw_statement(&body.query) {
        Ok(stmt) => stmt,
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Query, None, &user, &meta, &e.to_string())
                    .with_details(prefix),
            )
            .await;
            return Err(AppError::Core(e));
        }
    };

    let select = is_select(stmt);
    match tableops::execute_raw(&state.pool, stmt, select).await {
        Ok(RawOutcome::Rows { columns, rows }) => {
            let row_count = rows.len();
            let data = rows
                .iter()
                .map(|row| serialize_row(row, BinaryMode::Placeholder))
                .collect();

            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_success(AuditAction::Query, None, &user, &meta).with_details(prefix),
            )
            .await;

            Ok(Json(DataResponse {
                data: RawQueryResponse {
                    success: true,
                    columns: Some(columns),
                    data: Some(data),
                    row_count: Some(row_count),
                    affected_rows: None,
                },
            }))
        }
        Ok(RawOutcome::Affected(n)) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_success(AuditAction::Query, None, &user, &meta).with_details(prefix),
            )
            .await;

            Ok(Json(DataResponse {
                data: RawQueryResponse {
                    success: true,
                    columns: None,
                    data: None,
                    row_count: None,
                    affected_rows: Some(n),
                },
            }))
        }
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Query, None, &user, &meta, &e.to_string())
                    .with_details(prefix),
            )
            .await;
            Err(AppError::Database(e))
        }
    }
}
