//! Dynamic table operations: browse, export, insert, truncate, drop, raw
//! statements.
//!
//! Every table name interpolated here must already have passed the
//! identifier validator; values travel as bound parameters, cast server-side
//! to the live column type. The raw statement path is the single audited
//! exception.

use atmfleet_core::ident::quote_ident;
use atmfleet_core::value::CellValue;
use serde_json::Value;
use sqlx::PgPool;

use crate::catalog::ColumnDescriptor;
use crate::row::{column_names, decode_row};

/// Result of executing a raw statement.
#[derive(Debug)]
pub enum RawOutcome {
    /// A row-returning statement: column names plus decoded rows.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
    /// A non-SELECT statement: rows affected.
    Affected(u64),
}

/// Fetch up to `limit` rows in the store's natural order.
pub async fn fetch_rows(
    pool: &PgPool,
    table: &str,
    limit: i64,
) -> Result<Vec<Vec<CellValue>>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} LIMIT $1", quote_ident(table));
    let rows = sqlx::query(&sql).bind(limit).fetch_all(pool).await?;
    Ok(rows.iter().map(decode_row).collect())
}

/// Fetch the entire table (no LIMIT). Used by export and backup, which cap
/// or stream at their own layer.
pub async fn fetch_all_rows(
    pool: &PgPool,
    table: &str,
) -> Result<Vec<Vec<CellValue>>, sqlx::Error> {
    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    Ok(rows.iter().map(decode_row).collect())
}

/// Insert one caller-supplied row.
///
/// `columns` are the live descriptors for the fields being written (already
/// intersected with the row's keys by the caller); `values` are the
/// positional parameters, rendered to text and cast server-side to each
/// column's declared type.
pub async fn insert_row(
    pool: &PgPool,
    table: &str,
    columns: &[&ColumnDescriptor],
    values: &[Option<String>],
) -> Result<(), sqlx::Error> {
    debug_assert_eq!(columns.len(), values.len());

    let column_list = columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ");

    let placeholders = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("CAST(${} AS {})", i + 1, cast_for(&c.data_type)))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
        quote_ident(table)
    );

    let mut query = sqlx::query(&sql);
    for value in values {
        query = query.bind(value.as_deref());
    }
    query.execute(pool).await.map(|_| ())
}

/// Remove all rows (replace-mode import).
pub async fn truncate(pool: &PgPool, table: &str) -> Result<(), sqlx::Error> {
    let sql = format!("TRUNCATE TABLE {}", quote_ident(table));
    sqlx::query(&sql).execute(pool).await.map(|_| ())
}

/// Drop a table. Protection-list checks happen above this layer.
pub async fn drop_table(pool: &PgPool, table: &str) -> Result<(), sqlx::Error> {
    let sql = format!("DROP TABLE {}", quote_ident(table));
    sqlx::query(&sql).execute(pool).await.map(|_| ())
}

/// Execute a raw statement that already passed the statement guard.
pub async fn execute_raw(
    pool: &PgPool,
    stmt: &str,
    is_select: bool,
) -> Result<RawOutcome, sqlx::Error> {
    if is_select {
        let rows = sqlx::query(stmt).fetch_all(pool).await?;
        let columns = rows.first().map(column_names).unwrap_or_default();
        Ok(RawOutcome::Rows {
            columns,
            rows: rows.iter().map(decode_row).collect(),
        })
    } else {
        let result = sqlx::query(stmt).execute(pool).await?;
        Ok(RawOutcome::Affected(result.rows_affected()))
    }
}

/// Render a JSON value as a bindable text parameter.
///
/// `Null` binds SQL NULL; scalars bind their plain rendering; nested
/// containers bind their JSON text (for json/jsonb columns).
pub fn bind_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

/// The server-side cast target for a column's information-schema data type.
///
/// Unknown types fall back to `text`, which covers every character-like
/// column via assignment casts.
fn cast_for(data_type: &str) -> &'static str {
    match data_type {
        "smallint" => "smallint",
        "integer" => "integer",
        "bigint" => "bigint",
        "numeric" => "numeric",
        "real" => "real",
        "double precision" => "double precision",
        "boolean" => "boolean",
        "date" => "date",
        "time without time zone" => "time",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamptz",
        "uuid" => "uuid",
        "json" => "json",
        "jsonb" => "jsonb",
        "bytea" => "bytea",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_scalars_render_plainly() {
        assert_eq!(bind_param(&Value::Null), None);
        assert_eq!(bind_param(&Value::from("x")), Some("x".to_string()));
        assert_eq!(bind_param(&Value::from(12)), Some("12".to_string()));
        assert_eq!(bind_param(&Value::from(true)), Some("true".to_string()));
    }

    #[test]
    fn nested_json_renders_as_json_text() {
        let v: Value = serde_json::json!({"a": 1});
        assert_eq!(bind_param(&v), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn unknown_types_cast_through_text() {
        assert_eq!(cast_for("character varying"), "text");
        assert_eq!(cast_for("tsvector"), "text");
        assert_eq!(cast_for("bigint"), "bigint");
        assert_eq!(cast_for("timestamp with time zone"), "timestamptz");
    }
}
