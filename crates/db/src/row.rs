//! Decoding of dynamically-shaped result rows into the core cell model.
//!
//! Nothing here knows the schema in advance: every cell is decoded by the
//! column's reported Postgres type name. Decoding is best-effort by design;
//! a cell that cannot be read becomes [`CellValue::Other`] with a marker
//! string rather than failing the row.

use atmfleet_core::value::CellValue;
use sqlx::postgres::{PgColumn, PgRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// Column names of a result row, in result order.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Decode every cell of a row.
pub fn decode_row(row: &PgRow) -> Vec<CellValue> {
    row.columns()
        .iter()
        .map(|col| decode_cell(row, col))
        .collect()
}

fn decode_cell(row: &PgRow, col: &PgColumn) -> CellValue {
    let idx = col.ordinal();

    // NULL short-circuits before any typed decode.
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return CellValue::Null,
        Err(_) => return CellValue::Other("[unreadable]".to_string()),
        _ => {}
    }

    let type_name = col.type_info().name();
    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(idx).map(CellValue::Bool).ok(),
        "INT2" => row
            .try_get::<i16, _>(idx)
            .map(|v| CellValue::Int(v.into()))
            .ok(),
        "INT4" => row.try_get::<i32, _>(idx).map(CellValue::Int).ok(),
        "INT8" => row.try_get::<i64, _>(idx).map(CellValue::BigInt).ok(),
        "FLOAT4" => row
            .try_get::<f32, _>(idx)
            .map(|v| CellValue::Float(v.into()))
            .ok(),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(CellValue::Float).ok(),
        // Arbitrary-precision values keep their exact decimal rendering.
        "NUMERIC" => row
            .try_get::<rust_decimal::Decimal, _>(idx)
            .map(|v| CellValue::Other(v.to_string()))
            .ok(),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            row.try_get::<String, _>(idx).map(CellValue::Text).ok()
        }
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
            .map(CellValue::Timestamp)
            .ok(),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(idx)
            .map(CellValue::DateTime)
            .ok(),
        "DATE" => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .map(CellValue::Date)
            .ok(),
        "TIME" => row
            .try_get::<chrono::NaiveTime, _>(idx)
            .map(CellValue::Time)
            .ok(),
        "BYTEA" => row.try_get::<Vec<u8>, _>(idx).map(CellValue::Bytes).ok(),
        "JSON" | "JSONB" => row
            .try_get::<serde_json::Value, _>(idx)
            .map(CellValue::Json)
            .ok(),
        "UUID" => row
            .try_get::<uuid::Uuid, _>(idx)
            .map(|v| CellValue::Text(v.to_string()))
            .ok(),
        _ => None,
    };

    decoded
        // Unknown scalar kinds: try a plain text read before giving up.
        .or_else(|| row.try_get::<String, _>(idx).map(CellValue::Text).ok())
        .unwrap_or_else(|| CellValue::Other(format!("[{type_name}]")))
}
