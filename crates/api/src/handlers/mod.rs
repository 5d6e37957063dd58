//! Request handlers for the database administration surface.
//!
//! Every handler passes the capability gate first and emits exactly one
//! audit entry per attempt, success or failure. Helpers here attach the
//! caller's identity and request context to those entries.

use std::time::Duration;

use atmfleet_core::audit::AuditAction;
use atmfleet_db::audit::NewAuditLog;

use crate::middleware::auth::{AuthUser, RequestMeta};

pub mod audit;
pub mod backup;
pub mod encoding;
pub mod query;
pub mod tables;
pub mod transfer;

/// Upper bound for catalog scans; large schemas must not hold a request
/// open indefinitely.
pub(crate) const CATALOG_DEADLINE: Duration = Duration::from_secs(15);

/// A successful audit entry carrying caller identity and request context.
pub(crate) fn audit_success(
    action: AuditAction,
    table: Option<&str>,
    user: &AuthUser,
    meta: &RequestMeta,
) -> NewAuditLog {
    NewAuditLog::success(action, table)
        .with_user(user.user_id, user.user_name.clone())
        .with_request_context(meta.ip_address.clone(), meta.user_agent.clone())
}

/// A failed audit entry carrying caller identity, request context, and the
/// error message.
pub(crate) fn audit_failure(
    action: AuditAction,
    table: Option<&str>,
    user: &AuthUser,
    meta: &RequestMeta,
    error: &str,
) -> NewAuditLog {
    NewAuditLog::failure(action, table, error)
        .with_user(user.user_id, user.user_name.clone())
        .with_request_context(meta.ip_address.clone(), meta.user_agent.clone())
}
