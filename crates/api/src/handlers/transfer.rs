//! Handlers for table export and import.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use atmfleet_core::audit::AuditAction;
use atmfleet_core::csv::parse_csv;
use atmfleet_core::error::CoreError;
use atmfleet_core::ident::validate_identifier;
use atmfleet_core::value::{serialize_row, BinaryMode};
use atmfleet_db::audit::AuditLogRepo;
use atmfleet_db::catalog;
use atmfleet_db::tableops;

use crate::error::{AppError, AppResult};
use crate::handlers::{audit_failure, audit_success};
use crate::middleware::auth::RequestMeta;
use crate::middleware::gate::RequireManageDatabase;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub table: String,
}

/// GET /database/export?table=
///
/// Stream the full table as a downloadable JSON document named
/// `{table}_{date}.json`. Binary columns keep full fidelity (base64).
pub async fn export_table(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    Query(params): Query<ExportParams>,
) -> AppResult<impl IntoResponse> {
    let table = validate_identifier(&params.table)
        .map_err(AppError::Core)?
        .to_string();

    // Even a failed column read is an export attempt on record.
    let columns = match catalog::columns(&state.pool, &table).await {
        Ok(columns) => columns,
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Export, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            return Err(AppError::Database(e));
        }
    };
    if columns.is_empty() {
        let message = format!("table '{table}' not found");
        AuditLogRepo::record_best_effort(
            &state.pool,
            audit_failure(AuditAction::Export, Some(&table), &user, &meta, &message),
        )
        .await;
        return Err(AppError::Core(CoreError::NotFound {
            entity: "table",
            name: table,
        }));
    }

    let fetched = tableops::fetch_all_rows(&state.pool, &table).await;

    let rows = match fetched {
        Ok(rows) => rows,
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Export, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            return Err(AppError::Database(e));
        }
    };

    let row_count = rows.len();
    let document = serde_json::json!({
        "table": table,
        "exported_at": chrono::Utc::now().to_rfc3339(),
        "columns": columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "rows": rows
            .iter()
            .map(|row| serialize_row(row, BinaryMode::Base64))
            .collect::<Vec<_>>(),
    });

    AuditLogRepo::record_best_effort(
        &state.pool,
        audit_success(AuditAction::Export, Some(&table), &user, &meta)
            .with_details(format!("{row_count} rows")),
    )
    .await;

    let filename = format!("{table}_{}.json", chrono::Utc::now().format("%Y-%m-%d"));
    Ok(axum::response::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(document.to_string()))
        .unwrap()
        .into_response())
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Import mode: append rows or replace the table contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Append,
    Replace,
}

impl ImportMode {
    fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            other => Err(AppError::BadRequest(format!(
                "Unknown import mode '{other}'. Expected 'append' or 'replace'"
            ))),
        }
    }
}

/// Response for the import endpoint.
///
/// `skipped` counts rows rejected before reaching the store (no matching
/// columns); `failed` counts rows the store rejected. At most the first
/// [`MAX_ECHOED_ERRORS`] messages are echoed back; `error_count` always
/// carries the full tally.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub inserted_count: usize,
    pub total_rows: usize,
    pub skipped: usize,
    pub failed: usize,
    pub error_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Upper bound on echoed per-row error messages.
const MAX_ECHOED_ERRORS: usize = 10;

/// Upper bound on the uploaded file size.
const MAX_IMPORT_BYTES: usize = 20 * 1024 * 1024;

/// POST /database/import (multipart: `file`, `table`, `mode`)
///
/// Accepts a JSON array of objects or naive CSV (first line header; embedded
/// commas/newlines inside quoted fields are not supported). Rows are
/// inserted independently: one bad row never stops the loop, and the call
/// always completes with a summary.
pub async fn import_table(
    State(state): State<AppState>,
    RequireManageDatabase(user): RequireManageDatabase,
    meta: RequestMeta,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut table_field: Option<String> = None;
    let mut mode_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if bytes.len() > MAX_IMPORT_BYTES {
                    return Err(AppError::BadRequest(format!(
                        "Import file exceeds the {MAX_IMPORT_BYTES} byte limit"
                    )));
                }
                file = Some((filename, bytes.to_vec()));
            }
            "table" => {
                table_field = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "mode" => {
                mode_field = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;
    let table_raw =
        table_field.ok_or_else(|| AppError::BadRequest("Missing 'table' field".to_string()))?;
    let mode = ImportMode::parse(mode_field.as_deref().unwrap_or("append"))?;

    let table = validate_identifier(&table_raw)
        .map_err(AppError::Core)?
        .to_string();

    let columns = match catalog::columns(&state.pool, &table).await {
        Ok(columns) => columns,
        Err(e) => {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(AuditAction::Import, Some(&table), &user, &meta, &e.to_string()),
            )
            .await;
            return Err(AppError::Database(e));
        }
    };
    if columns.is_empty() {
        let message = format!("table '{table}' not found");
        AuditLogRepo::record_best_effort(
            &state.pool,
            audit_failure(AuditAction::Import, Some(&table), &user, &meta, &message),
        )
        .await;
        return Err(AppError::Core(CoreError::NotFound {
            entity: "table",
            name: table,
        }));
    }

    let rows = parse_rows(&filename, &bytes)?;
    let total_rows = rows.len();

    if mode == ImportMode::Replace {
        if let Err(e) = tableops::truncate(&state.pool, &table).await {
            AuditLogRepo::record_best_effort(
                &state.pool,
                audit_failure(
                    AuditAction::Import,
                    Some(&table),
                    &user,
                    &meta,
                    &format!("truncate failed: {e}"),
                ),
            )
            .await;
            return Err(AppError::Database(e));
        }
    }

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_no = index + 1;

        // Intersect the row's keys with the live column set; a row that
        // matches nothing is rejected, not silently dropped.
        let matched: Vec<_> = columns
            .iter()
            .filter(|c| row.contains_key(&c.name))
            .collect();
        if matched.is_empty() {
            skipped += 1;
            errors.push(format!("row {row_no}: no keys match any column of '{table}'"));
            continue;
        }

        let values: Vec<Option<String>> = matched
            .iter()
            .map(|c| tableops::bind_param(&row[&c.name]))
            .collect();

        match tableops::insert_row(&state.pool, &table, &matched, &values).await {
            Ok(()) => inserted += 1,
            Err(e) => {
                failed += 1;
                errors.push(format!("row {row_no}: {e}"));
            }
        }
    }

    let error_count = errors.len();
    errors.truncate(MAX_ECHOED_ERRORS);

    let result = ImportResult {
        success: error_count == 0,
        inserted_count: inserted,
        total_rows,
        skipped,
        failed,
        error_count,
        errors,
    };

    let entry = if result.success {
        audit_success(AuditAction::Import, Some(&table), &user, &meta)
    } else {
        audit_failure(
            AuditAction::Import,
            Some(&table),
            &user,
            &meta,
            &format!("{error_count} row errors"),
        )
    }
    .with_details(format!(
        "mode={mode:?} inserted={inserted}/{total_rows} skipped={skipped} failed={failed}"
    ));
    AuditLogRepo::record_best_effort(&state.pool, entry).await;

    Ok(Json(DataResponse { data: result }))
}

/// Parse the uploaded payload into rows of `column -> value`.
///
/// `.json` files must be a JSON array of objects; everything else is
/// treated as CSV. Empty CSV cells become SQL NULL.
fn parse_rows(filename: &str, bytes: &[u8]) -> Result<Vec<BTreeMap<String, Value>>, AppError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest("Import file is not valid UTF-8".to_string()))?;

    if filename.to_lowercase().ends_with(".json") {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;
        let Value::Array(items) = parsed else {
            return Err(AppError::BadRequest(
                "JSON import must be an array of objects".to_string(),
            ));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map.into_iter().collect()),
                _ => Err(AppError::BadRequest(format!(
                    "JSON import row {} is not an object",
                    i + 1
                ))),
            })
            .collect()
    } else {
        let doc = parse_csv(text)
            .ok_or_else(|| AppError::BadRequest("CSV file has no header line".to_string()))?;
        Ok(doc
            .rows
            .iter()
            .map(|fields| {
                doc.headers
                    .iter()
                    .zip(fields)
                    .map(|(header, field)| {
                        let value = if field.is_empty() {
                            Value::Null
                        } else {
                            Value::String(field.clone())
                        };
                        (header.clone(), value)
                    })
                    .collect()
            })
            .collect())
    }
}
