//! Handler for querying the audit trail.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use atmfleet_core::audit::AuditAction;
use atmfleet_core::types::{DbId, Timestamp};
use atmfleet_db::audit::{AuditLogFilter, AuditLogRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::audit_success;
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for audit log queries.
#[derive(Debug, Deserialize)]
pub struct AuditLogQueryParams {
    pub user_id: Option<DbId>,
    pub action: Option<String>,
    pub table_name: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}

/// Parse an optional ISO 8601 timestamp parameter.
fn parse_timestamp(s: &Option<String>) -> AppResult<Option<Timestamp>> {
    match s {
        Some(v) => v
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|_| AppError::BadRequest("Invalid date format".into())),
        None => Ok(None),
    }
}

/// GET /database/audit-logs
///
/// Query audit entries newest-first with optional filters. Reading the
/// trail is itself a privileged operation and leaves its own entry.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    Query(params): Query<AuditLogQueryParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(action) = &params.action {
        if AuditAction::parse(action).is_none() {
            return Err(AppError::BadRequest(format!(
                "Unknown audit action '{action}'"
            )));
        }
    }

    let filter = AuditLogFilter {
        user_id: params.user_id,
        action: params.action,
        table_name: params.table_name,
        from: parse_timestamp(&params.from)?,
        to: parse_timestamp(&params.to)?,
        limit: params.limit,
    };

    let entries = AuditLogRepo::query(&state.pool, &filter).await?;

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::View, Some("audit_logs"), &user, &meta),
    )
    .await;

    Ok(Json(DataResponse { data: entries }))
}
