//! HTTP-level integration tests for the table listing, analysis, browsing,
//! and deletion endpoints, including the authentication and capability
//! gates in front of them.

mod common;

use axum::http::StatusCode;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Gate behavior
// ---------------------------------------------------------------------------

/// Without a token, every administration endpoint returns 401.
#[sqlx::test(migrations = "../../migrations")]
async fn missing_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::get(app, "/api/v1/database/tables").await;
    let json = common::assert_status(response, StatusCode::UNAUTHORIZED).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

/// A garbage token returns 401, not 500.
#[sqlx::test(migrations = "../../migrations")]
async fn garbage_token_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::get_auth(app, "/api/v1/database/tables", "not-a-jwt").await;
    common::assert_status(response, StatusCode::UNAUTHORIZED).await;
}

/// A valid token for a deactivated account returns 403 even though the
/// signature and expiry check out.
#[sqlx::test(migrations = "../../migrations")]
async fn inactive_account_is_forbidden(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::token_for_user(7, Some("Former Admin"), "admin", false);

    let response = common::get_auth(app, "/api/v1/database/tables", &token).await;
    let json = common::assert_status(response, StatusCode::FORBIDDEN).await;
    assert!(
        json["error"].as_str().unwrap().contains("inactive-account"),
        "error should name the inactive account: {json}"
    );
}

/// Roles without the manage-database capability are rejected with 403.
#[sqlx::test(migrations = "../../migrations")]
async fn operator_and_viewer_roles_are_forbidden(pool: PgPool) {
    for role in ["operator", "viewer", "unknown-role"] {
        let app = common::build_test_app(pool.clone());
        let token = common::token_for(role);

        let response = common::get_auth(app, "/api/v1/database/tables", &token).await;
        let json = common::assert_status(response, StatusCode::FORBIDDEN).await;
        assert_eq!(json["code"], "FORBIDDEN", "role {role}: {json}");
    }
}

/// The dba role passes the gate like admin does.
#[sqlx::test(migrations = "../../migrations")]
async fn dba_role_passes_the_gate(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::token_for("dba");

    let response = common::get_auth(app, "/api/v1/database/tables", &token).await;
    common::assert_status(response, StatusCode::OK).await;
}

// ---------------------------------------------------------------------------
// Listing and analysis
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_tables_embeds_columns(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::token_for("admin");

    let response = common::get_auth(app, "/api/v1/database/tables", &token).await;
    let json = common::assert_status(response, StatusCode::OK).await;

    let tables = json["data"].as_array().expect("data should be an array");
    let atms = tables
        .iter()
        .find(|t| t["name"] == "atms")
        .expect("atms should be listed");

    let column_names: Vec<&str> = atms["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(column_names.contains(&"atm_code"));
    assert!(column_names.contains(&"is_active"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn analyze_classifies_and_aggregates(pool: PgPool) {
    sqlx::query("CREATE TABLE atms_backup_2019 (id BIGINT)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO atms_backup_2019 VALUES (1), (2), (3)")
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool);
    let token = common::token_for("admin");

    let response = common::get_auth(app, "/api/v1/database/analyze-tables", &token).await;
    let json = common::assert_status(response, StatusCode::OK).await;
    let data = &json["data"];

    let unused: Vec<&str> = data["unused_tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(unused, vec!["atms_backup_2019"]);

    let protected: Vec<&str> = data["protected_tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(protected.contains(&"audit_logs"));

    assert_eq!(data["statistics"]["unused_count"], 1);
    assert_eq!(data["statistics"]["unused_rows"], 3);
    assert_eq!(
        data["total_tables"].as_u64().unwrap() as usize,
        data["used_tables"].as_array().unwrap().len()
            + data["unused_tables"].as_array().unwrap().len()
            + protected.len()
    );
}

// ---------------------------------------------------------------------------
// Browsing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn browse_rejects_invalid_identifiers(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::token_for("admin");

    let response = common::get_auth(
        app,
        "/api/v1/database/table-data?table=atms%3B%20DROP%20TABLE%20banks",
        &token,
    )
    .await;
    common::assert_status(response, StatusCode::BAD_REQUEST).await;
}

/// A browse of a missing table fails with 404 and is still on record.
#[sqlx::test(migrations = "../../migrations")]
async fn browse_unknown_table_is_not_found_and_audited(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::token_for("admin");

    let response =
        common::get_auth(app, "/api/v1/database/table-data?table=no_such_table", &token).await;
    common::assert_status(response, StatusCode::NOT_FOUND).await;

    let entries = common::audit_entries(&pool).await;
    assert_eq!(entries.len(), 1);
    let (action, table, success) = &entries[0];
    assert_eq!(action, "VIEW");
    assert_eq!(table.as_deref(), Some("no_such_table"));
    assert!(!success);
}

/// Browsing returns rows in insertion order, reports the true total beyond
/// the limit, and leaves a VIEW audit entry from the detached write.
#[sqlx::test(migrations = "../../migrations")]
async fn browse_returns_rows_and_audits(pool: PgPool) {
    sqlx::query("INSERT INTO banks (code, name, city) VALUES ($1, $2, $3), ($4, $5, $6)")
        .bind("ZB").bind("Ziraat").bind("Ankara")
        .bind("IB").bind("Is Bankasi").bind("Istanbul")
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let token = common::token_for("admin");

    let response =
        common::get_auth(app, "/api/v1/database/table-data?table=banks&limit=1", &token).await;
    let json = common::assert_status(response, StatusCode::OK).await;
    let data = &json["data"];

    assert_eq!(data["total"], 2);
    assert_eq!(data["data"].as_array().unwrap().len(), 1);

    let columns: Vec<&str> = data["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    let code_idx = columns.iter().position(|c| *c == "code").unwrap();
    assert_eq!(data["data"][0][code_idx], "ZB");

    // The success-path audit write is detached; poll for it.
    let entries = common::wait_for_audit_entries(&pool, 1).await;
    let (action, table, success) = &entries[0];
    assert_eq!(action, "VIEW");
    assert_eq!(table.as_deref(), Some("banks"));
    assert!(success);
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Protected tables are refused even for admins, and the refusal is audited.
#[sqlx::test(migrations = "../../migrations")]
async fn protected_tables_cannot_be_dropped(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let token = common::token_for("admin");

    let response = common::delete_json_auth(
        app,
        "/api/v1/database/delete-table",
        &token,
        serde_json::json!({ "table": "audit_logs" }),
    )
    .await;
    common::assert_status(response, StatusCode::FORBIDDEN).await;

    let entries = common::audit_entries(&pool).await;
    let (action, table, success) = &entries[0];
    assert_eq!(action, "DELETE");
    assert_eq!(table.as_deref(), Some("audit_logs"));
    assert!(!success, "refused deletion must be audited as a failure");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unprotected_tables_are_dropped_and_audited(pool: PgPool) {
    sqlx::query("CREATE TABLE scratch_export (id BIGINT)")
        .execute(&pool)
        .await
        .unwrap();

    let app = common::build_test_app(pool.clone());
    let token = common::token_for("admin");

    let response = common::delete_json_auth(
        app,
        "/api/v1/database/delete-table",
        &token,
        serde_json::json!({ "table": "scratch_export" }),
    )
    .await;
    let json = common::assert_status(response, StatusCode::OK).await;
    assert_eq!(json["data"]["success"], true);

    // The table is gone.
    let gone = sqlx::query("SELECT 1 FROM scratch_export")
        .fetch_all(&pool)
        .await;
    assert!(gone.is_err());

    let entries = common::audit_entries(&pool).await;
    let (action, table, success) = &entries[0];
    assert_eq!(action, "DELETE");
    assert_eq!(table.as_deref(), Some("scratch_export"));
    assert!(success);
}
