//! Schema catalog reader: runtime introspection of the active schema.
//!
//! Everything here queries information-schema views or `pg_catalog` with
//! bound parameters; no caller-supplied text is ever interpolated. The one
//! exception, `COUNT(*)` over a dynamic table, quotes a name that has
//! already passed the identifier validator.

use atmfleet_core::ident::quote_ident;
use serde::Serialize;
use sqlx::PgPool;

/// One base table of the active schema, annotated on demand.
///
/// Request-scoped: produced for a single response, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub column_count: i64,
    pub row_count: i64,
    pub approx_size_kb: f64,
    /// Set when per-table introspection failed; the listing itself
    /// continues regardless.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One column of a table, ordered by physical position.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub max_length: Option<i32>,
    pub is_nullable: bool,
    pub collation: Option<String>,
}

/// List every base table in the `public` schema with its column count.
///
/// Row counts and sizes are fetched per-table afterwards (see
/// [`annotate_table`]) so one broken table cannot poison the listing.
pub async fn list_table_names(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT t.table_name::text, COUNT(c.column_name)::bigint \
         FROM information_schema.tables t \
         LEFT JOIN information_schema.columns c \
           ON c.table_schema = t.table_schema AND c.table_name = t.table_name \
         WHERE t.table_schema = 'public' AND t.table_type = 'BASE TABLE' \
         GROUP BY t.table_name \
         ORDER BY t.table_name",
    )
    .fetch_all(pool)
    .await
}

/// Exact row count with an approximate fallback.
///
/// Primary strategy is `COUNT(*)`; if that fails (lock, timeout,
/// permission) the planner estimate from `pg_class.reltuples` is used. If
/// both fail the error is surfaced so the caller can flag the table.
pub async fn row_count(pool: &PgPool, table: &str) -> Result<i64, sqlx::Error> {
    let exact = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {}",
        quote_ident(table)
    ))
    .fetch_one(pool)
    .await;

    match exact {
        Ok(count) => Ok(count),
        Err(primary_err) => {
            tracing::warn!(table = %table, error = %primary_err, "Exact row count failed, using estimate");
            sqlx::query_scalar::<_, i64>(
                "SELECT GREATEST(reltuples, 0)::bigint FROM pg_class \
                 WHERE relname = $1 AND relnamespace = 'public'::regnamespace",
            )
            .bind(table)
            .fetch_one(pool)
            .await
        }
    }
}

/// Approximate on-disk size in KiB. Best-effort: 0.0 when unknown.
pub async fn approx_size_kb(pool: &PgPool, table: &str) -> f64 {
    let bytes = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(pg_total_relation_size(to_regclass($1)), 0)::bigint",
    )
    .bind(format!("public.{}", quote_ident(table)))
    .fetch_one(pool)
    .await;

    match bytes {
        Ok(b) => b as f64 / 1024.0,
        Err(e) => {
            tracing::warn!(table = %table, error = %e, "Table size lookup failed");
            0.0
        }
    }
}

/// Fill in row count and size for one table, attaching failures to the
/// descriptor instead of propagating them.
pub async fn annotate_table(pool: &PgPool, name: String, column_count: i64) -> TableDescriptor {
    let (row_count, error) = match row_count(pool, &name).await {
        Ok(count) => (count, None),
        Err(e) => (0, Some(e.to_string())),
    };
    let approx_size_kb = approx_size_kb(pool, &name).await;

    TableDescriptor {
        name,
        column_count,
        row_count,
        approx_size_kb,
        error,
    }
}

/// Column descriptors for a table, in physical column order.
pub async fn columns(pool: &PgPool, table: &str) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
    sqlx::query_as::<_, ColumnDescriptor>(
        "SELECT column_name::text AS name, \
                data_type::text AS data_type, \
                character_maximum_length::int AS max_length, \
                (is_nullable = 'YES') AS is_nullable, \
                collation_name::text AS collation \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 \
         ORDER BY ordinal_position",
    )
    .bind(table)
    .fetch_all(pool)
    .await
}

/// The collation of the active database (diagnostic).
pub async fn server_collation(pool: &PgPool) -> Result<String, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT datcollate::text FROM pg_database WHERE datname = current_database()",
    )
    .fetch_one(pool)
    .await
}
