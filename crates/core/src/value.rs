// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Scalar cell values.
//!
//! Local storage keeps values in their native storage class (TEXT/REAL/NULL);
//! the remote store only ever sees the trimmed string coercion produced by
//! [`Value::as_cell`]. Composite-key comparison runs on the same coercion,
//! so a local `Number(7.0)` and a remote `"7"` compare equal, while a local
//! TEXT `"7"` stored by an older writer against a remote numeric column does
//! not round-trip through SQLite equality (see the repository docs).

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Free-form text.
    Text(String),
    /// Numeric value; integers and floats share one representation.
    Number(f64),
    /// Absent / NULL cell.
    Empty,
}

impl Value {
    /// The trimmed string coercion used for comparison and remote transmission.
    ///
    /// Numbers without a fractional part render without a decimal point,
    /// matching how spreadsheet cells display whole numbers.
    pub fn as_cell(&self) -> String {
        match self {
            Value::Text(s) => s.trim().to_string(),
            Value::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Empty => String::new(),
        }
    }

    /// True when the cell coerces to the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cell())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Number(n) => ToSqlOutput::from(*n),
            Value::Empty => ToSqlOutput::Owned(rusqlite::types::Value::Null),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(Value::Empty),
            ValueRef::Integer(i) => Ok(Value::Number(i as f64)),
            ValueRef::Real(f) => Ok(Value::Number(f)),
            ValueRef::Text(t) => std::str::from_utf8(t)
                .map(|s| Value::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            ValueRef::Blob(_) => Err(FromSqlError::InvalidType),
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
