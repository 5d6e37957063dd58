//! Shared harness for HTTP-level integration tests.
//!
//! Builds the application through [`build_app_router`] so tests exercise
//! the same middleware stack (CORS, request ID, timeout, tracing, panic
//! recovery) that production uses.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use atmfleet_api::auth::jwt::{generate_access_token, JwtConfig};
use atmfleet_api::config::ServerConfig;
use atmfleet_api::router::build_app_router;
use atmfleet_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-that-is-long-enough".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Issue a signed access token for an active user with the given role.
pub fn token_for(role: &str) -> String {
    token_for_user(1, Some("Test Admin"), role, true)
}

/// Issue a signed access token with full control over the claims.
pub fn token_for_user(user_id: i64, name: Option<&str>, role: &str, active: bool) -> String {
    generate_access_token(user_id, name, role, active, &test_config().jwt)
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send an unauthenticated GET request.
pub async fn get(app: Router, path: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send an authenticated GET request.
pub async fn get_auth(app: Router, path: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send an authenticated POST with a JSON body.
pub async fn post_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send an authenticated POST with an empty body.
pub async fn post_auth(app: Router, path: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send an authenticated DELETE with a JSON body.
pub async fn delete_json_auth(
    app: Router,
    path: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send an authenticated multipart POST (single pre-built body).
pub async fn post_multipart_auth(
    app: Router,
    path: &str,
    token: &str,
    boundary: &str,
    body: Vec<u8>,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// Assert the response has the expected status, dumping the body on failure.
pub async fn assert_status(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let json = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {json}");
    json
}

// ---------------------------------------------------------------------------
// Multipart assembly
// ---------------------------------------------------------------------------

/// Build a multipart/form-data body with `table`, `mode`, and `file` fields.
pub fn import_body(boundary: &str, table: &str, mode: &str, filename: &str, file: &str) -> Vec<u8> {
    let mut body = String::new();
    for (name, value) in [("table", table), ("mode", mode)] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
         filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{file}\r\n"
    ));
    body.push_str(&format!("--{boundary}--\r\n"));
    body.into_bytes()
}

// ---------------------------------------------------------------------------
// Audit inspection
// ---------------------------------------------------------------------------

/// Fetch all audit entries newest-first, straight from the table.
pub async fn audit_entries(pool: &PgPool) -> Vec<(String, Option<String>, bool)> {
    sqlx::query_as(
        "SELECT action, table_name, success FROM audit_logs ORDER BY id DESC",
    )
    .fetch_all(pool)
    .await
    .expect("audit query should succeed")
}

/// Wait (briefly) until the audit table holds at least `count` entries.
///
/// Browse success entries are written from a detached task, so tests poll
/// instead of assuming the write landed before the response.
pub async fn wait_for_audit_entries(pool: &PgPool, count: usize) -> Vec<(String, Option<String>, bool)> {
    for _ in 0..50 {
        let entries = audit_entries(pool).await;
        if entries.len() >= count {
            return entries;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("audit log never reached {count} entries");
}
