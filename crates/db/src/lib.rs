//! Data access for the fleet database administration toolkit.
//!
//! Pool construction, schema catalog introspection, dynamic table
//! operations, the audit log repository, and row decoding into the core
//! cell model.

use sqlx::postgres::PgPoolOptions;

pub mod audit;
pub mod catalog;
pub mod row;
pub mod tableops;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
///
/// The pool is the only shared mutable resource in the system; it is built
/// once at process start and injected into every component.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
