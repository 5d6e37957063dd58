//! Handlers for the encoding check and the multi-step repair procedure.
//!
//! The repair is a fixed plan over four tables (see
//! `atmfleet_core::encoding`). Each (table, column) pair is one independent
//! unit of work: its failure lands in `errors[]` and the remaining pairs
//! still run. The whole procedure is idempotent; a second run reports every
//! pair as already correct.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;

use atmfleet_core::audit::AuditAction;
use atmfleet_core::encoding::{
    RepairOutcome, RepairStepReport, RepairSummary, RepairTarget, REPAIR_PLAN,
};
use atmfleet_db::audit::AuditLogRepo;
use atmfleet_db::catalog;

use crate::error::AppResult;
use crate::handlers::{audit_failure, audit_success};
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Live status of one plan column.
#[derive(Debug, Serialize)]
pub struct ColumnEncodingStatus {
    pub table_name: String,
    pub column_name: String,
    pub data_type: Option<String>,
    pub max_length: Option<i32>,
    pub collation: Option<String>,
    pub already_correct: bool,
}

/// Response for `GET /database/check-encoding`.
#[derive(Debug, Serialize)]
pub struct EncodingCheckResponse {
    pub server_collation: Option<String>,
    pub columns: Vec<ColumnEncodingStatus>,
}

/// Response for `POST /database/fix-encoding-after-restore`.
#[derive(Debug, Serialize)]
pub struct EncodingRepairResponse {
    pub success: bool,
    pub results: Vec<RepairStepReport>,
    pub final_check: Vec<ColumnEncodingStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub summary: RepairSummary,
}

// ---------------------------------------------------------------------------
// Check (read-only)
// ---------------------------------------------------------------------------

/// GET /database/check-encoding
///
/// The read-only half of the repair: server collation plus the live status
/// of every plan column.
pub async fn check_encoding(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
) -> AppResult<impl IntoResponse> {
    let server_collation = catalog::server_collation(&state.pool).await.ok();
    let columns = read_plan_statuses(&state.pool).await;

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::View, None, &user, &meta).with_details("check-encoding"),
    )
    .await;

    Ok(Json(DataResponse {
        data: EncodingCheckResponse {
            server_collation,
            columns,
        },
    }))
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// POST /database/fix-encoding-after-restore
///
/// Run the fixed repair plan. Step 1 reads the server collation
/// (diagnostic), steps 2-5 repair the four tables column by column, step 6
/// re-reads everything as the final verification snapshot.
pub async fn fix_encoding(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
) -> AppResult<impl IntoResponse> {
    let mut errors: Vec<String> = Vec::new();

    // Step 1: diagnostic read of the server collation.
    if let Err(e) = catalog::server_collation(&state.pool).await {
        errors.push(format!("step 1: server collation read failed: {e}"));
    }

    // Steps 2-5: one unit of work per (table, column) pair.
    let mut results = Vec::with_capacity(REPAIR_PLAN.len());
    for target in REPAIR_PLAN {
        let report = repair_one_column(&state.pool, target).await;
        if report.outcome == RepairOutcome::Error {
            errors.push(format!(
                "step {}: {}.{}: {}",
                report.step_number, report.table_name, report.column_name, report.message
            ));
        }
        results.push(report);
    }

    // Step 6: final verification snapshot.
    let final_check = read_plan_statuses(&state.pool).await;

    let failed_steps = errors.len() as u32;
    // Diagnostic + one unit per plan pair + final check.
    let total_units = REPAIR_PLAN.len() as u32 + 2;
    let summary = RepairSummary {
        total_steps: total_units,
        successful_steps: total_units - failed_steps,
        failed_steps,
    };
    let success = errors.is_empty();

    let entry = if success {
        audit_success(AuditAction::Update, None, &user, &meta)
    } else {
        audit_failure(
            AuditAction::Update,
            None,
            &user,
            &meta,
            &format!("{failed_steps} failed steps"),
        )
    }
    .with_details("fix-encoding-after-restore");
    AuditLogRepo::record_best_effort(&state.pool, entry).await;

    Ok(Json(DataResponse {
        data: EncodingRepairResponse {
            success,
            results,
            final_check,
            errors,
            summary,
        },
    }))
}

/// Inspect and, when needed, alter one plan column. Failures are captured
/// in the report, never propagated.
async fn repair_one_column(pool: &PgPool, target: &RepairTarget) -> RepairStepReport {
    let before = match column_status(pool, target).await {
        Ok(Some(status)) => status,
        Ok(None) => {
            return step_report(target, "missing", "missing", RepairOutcome::Error,
                "column not found in catalog");
        }
        Err(e) => {
            return step_report(target, "unknown", "unknown", RepairOutcome::Error, &e.to_string());
        }
    };

    let before_type = describe(&before);

    if before.already_correct {
        return step_report(
            target,
            &before_type,
            &before_type,
            RepairOutcome::AlreadyCorrect,
            "already correct",
        );
    }

    if let Err(e) = sqlx::query(&target.alter_sql()).execute(pool).await {
        return step_report(target, &before_type, &before_type, RepairOutcome::Error,
            &e.to_string());
    }

    let after_type = match column_status(pool, target).await {
        Ok(Some(after)) => describe(&after),
        _ => format!("varchar({})", target.max_len),
    };

    step_report(target, &before_type, &after_type, RepairOutcome::Altered, "altered")
}

fn step_report(
    target: &RepairTarget,
    before: &str,
    after: &str,
    outcome: RepairOutcome,
    message: &str,
) -> RepairStepReport {
    RepairStepReport {
        step_number: target.step,
        table_name: target.table.to_string(),
        column_name: target.column.to_string(),
        before_type: before.to_string(),
        after_type: after.to_string(),
        outcome,
        message: message.to_string(),
    }
}

fn describe(status: &ColumnEncodingStatus) -> String {
    let base = status.data_type.as_deref().unwrap_or("unknown");
    match (status.max_length, status.collation.as_deref()) {
        (Some(len), Some(coll)) => format!("{base}({len}) COLLATE \"{coll}\""),
        (Some(len), None) => format!("{base}({len})"),
        (None, Some(coll)) => format!("{base} COLLATE \"{coll}\""),
        (None, None) => base.to_string(),
    }
}

/// Read the live status of one plan column.
async fn column_status(
    pool: &PgPool,
    target: &RepairTarget,
) -> Result<Option<ColumnEncodingStatus>, sqlx::Error> {
    let columns = catalog::columns(pool, target.table).await?;
    Ok(columns.into_iter().find(|c| c.name == target.column).map(|c| {
        let already_correct =
            target.is_already_correct(&c.data_type, c.max_length, c.collation.as_deref());
        ColumnEncodingStatus {
            table_name: target.table.to_string(),
            column_name: target.column.to_string(),
            data_type: Some(c.data_type),
            max_length: c.max_length,
            collation: c.collation,
            already_correct,
        }
    }))
}

/// Live status of every plan column, in plan order. Unreadable columns are
/// reported as unknown rather than failing the whole read.
async fn read_plan_statuses(pool: &PgPool) -> Vec<ColumnEncodingStatus> {
    let mut statuses = Vec::with_capacity(REPAIR_PLAN.len());
    for target in REPAIR_PLAN {
        match column_status(pool, target).await {
            Ok(Some(status)) => statuses.push(status),
            _ => statuses.push(ColumnEncodingStatus {
                table_name: target.table.to_string(),
                column_name: target.column.to_string(),
                data_type: None,
                max_length: None,
                collation: None,
                already_correct: false,
            }),
        }
    }
    statuses
}
