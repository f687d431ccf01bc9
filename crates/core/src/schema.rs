// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-table schema descriptors and the immutable registry.
//!
//! The registry is constructed once at startup and passed by reference into
//! the repository and orchestrator constructors; there is deliberately no
//! global registry. Declaration order is preserved because the all-tables
//! sweep processes tables in that order.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ConfigError, Result};

/// How a table participates in synchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Local dirty rows are pushed; new remote rows are pulled.
    #[default]
    Bidirectional,
    /// Remote is authoritative; local rows are never pushed.
    PullOnly,
    /// Never touched by sync.
    Excluded,
}

/// Ordered list of primary-key column names.
///
/// Configuration accepts either a single column name or a list; both are
/// normalized to a list so the engine handles every key uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey(Vec<String>);

impl PrimaryKey {
    /// Create a composite key from column names.
    pub fn new(columns: Vec<String>) -> Self {
        PrimaryKey(columns)
    }

    /// Create a single-column key.
    pub fn single(column: impl Into<String>) -> Self {
        PrimaryKey(vec![column.into()])
    }

    /// The key columns in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for PrimaryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Single(String),
            Composite(Vec<String>),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Single(c) => PrimaryKey(vec![c]),
            Raw::Composite(cs) => PrimaryKey(cs),
        })
    }
}

impl Serialize for PrimaryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.len() == 1 {
            serializer.serialize_str(&self.0[0])
        } else {
            self.0.serialize(serializer)
        }
    }
}

/// Configuration record for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, shared between local storage and the remote store.
    pub name: String,
    /// Primary key; tables without one are skipped by the sweep.
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    /// Full column list, in the exact order written to and read from the
    /// remote store.
    pub columns: Vec<String>,
    /// Sync participation mode.
    #[serde(default)]
    pub mode: SyncMode,
}

impl TableSchema {
    /// The primary-key columns, when a key is declared.
    pub fn key_columns(&self) -> Option<&[String]> {
        self.primary_key.as_ref().map(PrimaryKey::columns)
    }

    /// True when the sweep should reconcile this table.
    pub fn is_syncable(&self) -> bool {
        self.primary_key.is_some() && self.mode != SyncMode::Excluded
    }
}

/// Immutable registry of table schemas, keyed by name.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: Vec<TableSchema>,
    by_name: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a registry, validating every entry.
    pub fn new(tables: Vec<TableSchema>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            if by_name.insert(table.name.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }
            if table.columns.is_empty() {
                return Err(ConfigError::NoColumns(table.name.clone()));
            }
            if let Some(key) = table.key_columns() {
                if key.is_empty() {
                    return Err(ConfigError::EmptyPrimaryKey(table.name.clone()));
                }
                for column in key {
                    if !table.columns.contains(column) {
                        return Err(ConfigError::UnknownKeyColumn {
                            table: table.name.clone(),
                            column: column.clone(),
                        });
                    }
                }
            }
        }
        Ok(SchemaRegistry { tables, by_name })
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.by_name.get(name).map(|&idx| &self.tables[idx])
    }

    /// All tables, in declaration order.
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
