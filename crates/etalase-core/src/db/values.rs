//! Conversions between model fields and libSQL values

use libsql::{Row, Value};

use crate::error::{Error, Result};

pub fn text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::Text(value.to_string()))
}

pub fn real(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

pub fn integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

pub fn json(value: Option<&serde_json::Value>) -> Result<Value> {
    value.map_or(Ok(Value::Null), |value| {
        Ok(Value::Text(serde_json::to_string(value)?))
    })
}

pub fn opt_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(value) => Ok(Some(value)),
        Value::Integer(value) => Ok(Some(value.to_string())),
        Value::Real(value) => Ok(Some(value.to_string())),
        Value::Blob(_) => Err(unexpected(idx, "blob")),
    }
}

pub fn req_text(row: &Row, idx: i32) -> Result<String> {
    opt_text(row, idx)?.ok_or_else(|| unexpected(idx, "null"))
}

pub fn opt_real(row: &Row, idx: i32) -> Result<Option<f64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Real(value) => Ok(Some(value)),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(value) => Ok(Some(value as f64)),
        Value::Text(_) => Err(unexpected(idx, "text")),
        Value::Blob(_) => Err(unexpected(idx, "blob")),
    }
}

pub fn opt_integer(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        Value::Real(_) => Err(unexpected(idx, "real")),
        Value::Text(_) => Err(unexpected(idx, "text")),
        Value::Blob(_) => Err(unexpected(idx, "blob")),
    }
}

pub fn req_integer(row: &Row, idx: i32) -> Result<i64> {
    opt_integer(row, idx)?.ok_or_else(|| unexpected(idx, "null"))
}

pub fn opt_json(row: &Row, idx: i32) -> Result<Option<serde_json::Value>> {
    opt_text(row, idx)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(Error::from)
}

pub fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Database(format!("Invalid row id: {raw}")))
}

fn unexpected(idx: i32, found: &str) -> Error {
    Error::Database(format!("Unexpected {found} value in column {idx}"))
}
