//! Conversions between libsql values and logical fields.
//!
//! libsql rows are positional and untyped, so every read names the column
//! it expects for error reporting.

use ::libsql::{Row, Value};

use super::super::encoding::bigint_blob::{self, Stored};
use crate::error::{AppError, AppResult};

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub fn opt_text(value: Option<&str>) -> Value {
    match value {
        Some(v) => Value::Text(v.to_string()),
        None => Value::Null,
    }
}

pub fn blob_bigint(value: i64) -> Value {
    Value::Blob(bigint_blob::encode(value))
}

fn column(row: &Row, index: i32, name: &str) -> AppResult<Value> {
    row.get_value(index)
        .map_err(|e| AppError::from_libsql(&format!("Failed to read column {}", name), e))
}

pub fn get_text(row: &Row, index: i32, name: &str) -> AppResult<String> {
    match column(row, index, name)? {
        Value::Text(s) => Ok(s),
        other => Err(AppError::Decode(format!(
            "column {} expected text, got {:?}",
            name, other
        ))),
    }
}

pub fn get_opt_text(row: &Row, index: i32, name: &str) -> AppResult<Option<String>> {
    match column(row, index, name)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(AppError::Decode(format!(
            "column {} expected text or null, got {:?}",
            name, other
        ))),
    }
}

/// Big integers are stored as decimal digits in a BLOB. Rows written by
/// other clients may carry the digits as text or a plain integer.
pub fn get_bigint(row: &Row, index: i32, name: &str) -> AppResult<i64> {
    match column(row, index, name)? {
        Value::Blob(bytes) => bigint_blob::decode_stored(Stored::Digits(&bytes)),
        Value::Text(s) => bigint_blob::decode_stored(Stored::Digits(s.as_bytes())),
        Value::Integer(i) => bigint_blob::decode_stored(Stored::Integer(i)),
        other => Err(AppError::Decode(format!(
            "column {} expected big integer, got {:?}",
            name, other
        ))),
    }
}
