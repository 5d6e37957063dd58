//! Serialization of driver-level result-set values into JSON-safe form.
//!
//! The database layer decodes each column into a [`CellValue`]; this module
//! turns those into `serde_json::Value`s that survive transport: 64-bit
//! integers beyond the JSON-safe range become decimal strings, temporal
//! values become ISO-8601 strings, and binary columns become either a base64
//! string (full fidelity, used by backup) or a short placeholder (used by
//! interactive browsing to bound payload size).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

/// Largest integer magnitude a JSON number can carry without precision loss.
pub const MAX_SAFE_JSON_INT: i64 = (1 << 53) - 1;

/// How binary column values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryMode {
    /// `"[Binary: N bytes]"` placeholder. Used for interactive browsing.
    Placeholder,
    /// Base64 of the full payload. Used for backup snapshots.
    Base64,
}

/// A single decoded result-set cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Bytes(Vec<u8>),
    Json(Value),
    /// A scalar kind the decoder does not model; carried as display text.
    Other(String),
}

/// Serialize one cell into a transport-safe JSON value.
///
/// Total: never fails, unknown kinds pass through as their display string.
pub fn serialize_cell(cell: &CellValue, mode: BinaryMode) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Int(i) => Value::from(*i),
        CellValue::BigInt(i) => {
            if i.abs() > MAX_SAFE_JSON_INT {
                Value::String(i.to_string())
            } else {
                Value::from(*i)
            }
        }
        CellValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Timestamp(ts) => Value::String(ts.to_rfc3339()),
        CellValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        CellValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        CellValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
        CellValue::Bytes(bytes) => match mode {
            BinaryMode::Placeholder => Value::String(format!("[Binary: {} bytes]", bytes.len())),
            BinaryMode::Base64 => Value::String(BASE64.encode(bytes)),
        },
        CellValue::Json(v) => v.clone(),
        CellValue::Other(repr) => Value::String(repr.clone()),
    }
}

/// Serialize a whole decoded row.
pub fn serialize_row(cells: &[CellValue], mode: BinaryMode) -> Vec<Value> {
    cells.iter().map(|c| serialize_cell(c, mode)).collect()
}
