//! Repository for the append-only `audit_logs` table.
//!
//! Entries are written exactly once per privileged operation attempt and
//! never updated or deleted by the application. The write path is
//! best-effort: an audit failure is logged to the tracing channel and never
//! propagated, so it cannot fail the operation it documents.

use atmfleet_core::audit::AuditAction;
use atmfleet_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str = "\
    id, user_id, user_name, action, table_name, details, \
    ip_address, user_agent, success, error_message, created_at";

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLogEntry {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub action: String,
    pub table_name: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<DbId>,
    pub user_name: Option<String>,
    pub action: AuditAction,
    pub table_name: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl NewAuditLog {
    /// A successful entry for `action`, optionally scoped to a table.
    pub fn success(action: AuditAction, table_name: Option<&str>) -> Self {
        Self {
            user_id: None,
            user_name: None,
            action,
            table_name: table_name.map(str::to_string),
            details: None,
            ip_address: None,
            user_agent: None,
            success: true,
            error_message: None,
        }
    }

    /// A failed entry for `action` carrying the error message.
    pub fn failure(action: AuditAction, table_name: Option<&str>, error: &str) -> Self {
        Self {
            success: false,
            error_message: Some(error.to_string()),
            ..Self::success(action, table_name)
        }
    }

    pub fn with_user(mut self, user_id: DbId, user_name: Option<String>) -> Self {
        self.user_id = Some(user_id);
        self.user_name = user_name;
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_request_context(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Filter parameters for querying audit logs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<DbId>,
    pub action: Option<String>,
    pub table_name: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Query and insert operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Insert one entry, returning the stored row.
    pub async fn insert(pool: &PgPool, entry: &NewAuditLog) -> Result<AuditLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs \
             (user_id, user_name, action, table_name, details, \
              ip_address, user_agent, success, error_message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogEntry>(&query)
            .bind(entry.user_id)
            .bind(&entry.user_name)
            .bind(entry.action.as_str())
            .bind(&entry.table_name)
            .bind(&entry.details)
            .bind(&entry.ip_address)
            .bind(&entry.user_agent)
            .bind(entry.success)
            .bind(&entry.error_message)
            .fetch_one(pool)
            .await
    }

    /// Insert one entry, swallowing any failure.
    ///
    /// The failure of an audit write must never roll back or fail the
    /// operation it documents; it is reported on the tracing channel only.
    pub async fn record_best_effort(pool: &PgPool, entry: NewAuditLog) {
        if let Err(e) = Self::insert(pool, &entry).await {
            tracing::error!(
                action = %entry.action,
                table = entry.table_name.as_deref().unwrap_or(""),
                error = %e,
                "Failed to write audit log entry"
            );
        }
    }

    /// Query entries newest-first with optional filters.
    ///
    /// `limit` defaults to 100 and is capped at 500.
    pub async fn query(
        pool: &PgPool,
        filter: &AuditLogFilter,
    ) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(100).clamp(1, 500);

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COLUMNS} FROM audit_logs WHERE 1=1"));

        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(action) = &filter.action {
            qb.push(" AND action = ").push_bind(action.clone());
        }
        if let Some(table_name) = &filter.table_name {
            qb.push(" AND table_name = ").push_bind(table_name.clone());
        }
        if let Some(from) = filter.from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND created_at <= ").push_bind(to);
        }

        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit);

        qb.build_query_as::<AuditLogEntry>().fetch_all(pool).await
    }
}
