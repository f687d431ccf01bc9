// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Change-tracked rows and composite-key derivation.
//!
//! A [`Row`] is an unordered column→value mapping; ordering is always imposed
//! by the owning table's schema when a row is shaped for storage or for the
//! remote store. The composite key is the pipe-joined trimmed string of the
//! primary-key columns in schema order and is the sync-time identity of a
//! row on both sides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value::Value;

/// Separator between composite-key segments.
pub const KEY_SEPARATOR: char = '|';

/// Local-only per-row sync marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Row matches the last confirmed remote write.
    Clean,
    /// Row has unpushed local changes.
    Dirty,
}

impl SyncStatus {
    /// String representation persisted in the `sync_status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Clean => "clean",
            SyncStatus::Dirty => "dirty",
        }
    }

    /// Parse the persisted representation.
    pub fn parse(s: &str) -> Option<SyncStatus> {
        match s {
            "clean" => Some(SyncStatus::Clean),
            "dirty" => Some(SyncStatus::Dirty),
            _ => None,
        }
    }
}

/// A mapping from column name to cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: HashMap<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Row::default()
    }

    /// Set a column value, replacing any previous value.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Builder-style [`Row::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Get a column value, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// The trimmed string coercion of a column; `""` when absent.
    pub fn cell(&self, column: &str) -> String {
        self.values.get(column).map(Value::as_cell).unwrap_or_default()
    }

    /// Iterate over the columns present in this row.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of columns present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no columns are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The trimmed primary-key segment values, in the given column order.
    pub fn key_segments(&self, key_columns: &[String]) -> Vec<String> {
        key_columns.iter().map(|c| self.cell(c)).collect()
    }

    /// The composite key over the given primary-key columns.
    ///
    /// Returns `None` when every segment is empty; such rows carry no usable
    /// identity and are excluded from both push and pull.
    pub fn composite_key(&self, key_columns: &[String]) -> Option<String> {
        let segments = self.key_segments(key_columns);
        if segments.iter().all(String::is_empty) {
            return None;
        }
        Some(segments.join(&KEY_SEPARATOR.to_string()))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "row_tests.rs"]
mod tests;
