// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed change-tracked repository.
//!
//! The only local mutation path the UI layer is permitted to use. Every row
//! carries two bookkeeping columns beyond its business columns: a
//! `sync_status` dirty marker and an `updated_at` RFC3339 audit timestamp
//! written on every local write. All SQL is assembled from the schema
//! registry's declared column lists and executed with bound parameters; no
//! value ever reaches the statement text.
//!
//! Key lookups compare the stored value against the trimmed key string with
//! plain SQLite equality. A row stored with a native numeric key therefore
//! matches the string `"7"` only through SQLite's TEXT/NUMERIC comparison
//! rules on the column's declared affinity; columns are declared without
//! affinity so values keep their native storage class, and mixed-type keys
//! between local and remote representations remain a correctness hazard of
//! the design rather than something this layer papers over.

use chrono::Utc;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use depot_core::{Row, SchemaRegistry, SyncStatus, TableSchema, Value};

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The table is not in the schema registry. Configuration error, never
    /// a silent no-op.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A keyed operation was attempted on a table with no declared key.
    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),

    /// A write referenced a column the schema does not declare.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// A schema declares a business column that collides with bookkeeping.
    #[error("table '{table}' declares reserved column '{column}'")]
    ReservedColumn { table: String, column: String },

    /// A key value list did not match the declared key width.
    #[error("table '{table}' expects {expected} key segment(s), got {got}")]
    KeyArity {
        table: String,
        expected: usize,
        got: usize,
    },

    /// A persisted bookkeeping value could not be parsed.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// Local storage I/O failure; propagates immediately, no retries.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Bookkeeping columns appended to every local table.
const SYNC_STATUS_COL: &str = "sync_status";
const UPDATED_AT_COL: &str = "updated_at";

/// Local storage with a persisted per-row dirty marker.
#[derive(Debug)]
pub struct Repository {
    conn: Connection,
    registry: Arc<SchemaRegistry>,
}

impl Repository {
    /// Open (or create) the local store at `path` and ensure one table per
    /// registry entry exists.
    pub fn open(path: &Path, registry: Arc<SchemaRegistry>) -> RepositoryResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, registry)
    }

    /// Open an in-memory store (tests and scratch tooling).
    pub fn open_in_memory(registry: Arc<SchemaRegistry>) -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, registry)
    }

    fn with_connection(conn: Connection, registry: Arc<SchemaRegistry>) -> RepositoryResult<Self> {
        for schema in registry.tables() {
            for column in &schema.columns {
                if column == SYNC_STATUS_COL || column == UPDATED_AT_COL {
                    return Err(RepositoryError::ReservedColumn {
                        table: schema.name.clone(),
                        column: column.clone(),
                    });
                }
            }
            conn.execute_batch(&create_table_sql(schema))?;
        }
        Ok(Repository { conn, registry })
    }

    fn schema(&self, table: &str) -> RepositoryResult<&TableSchema> {
        self.registry
            .get(table)
            .ok_or_else(|| RepositoryError::UnknownTable(table.to_string()))
    }

    fn key_columns<'a>(&self, schema: &'a TableSchema) -> RepositoryResult<&'a [String]> {
        schema
            .key_columns()
            .ok_or_else(|| RepositoryError::MissingPrimaryKey(schema.name.clone()))
    }

    fn check_key_arity(
        schema: &TableSchema,
        key_columns: &[String],
        key: &[String],
    ) -> RepositoryResult<()> {
        if key.len() != key_columns.len() {
            return Err(RepositoryError::KeyArity {
                table: schema.name.clone(),
                expected: key_columns.len(),
                got: key.len(),
            });
        }
        Ok(())
    }

    /// Upsert a row by primary key.
    ///
    /// The given status is written verbatim on both the insert and conflict
    /// paths. Caller contract: fresh local creations pass [`SyncStatus::Dirty`],
    /// freshly pulled remote rows pass [`SyncStatus::Clean`]. The repository
    /// does not enforce which is which.
    pub fn insert(&self, table: &str, row: &Row, status: SyncStatus) -> RepositoryResult<()> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;

        let mut values: Vec<Value> = schema
            .columns
            .iter()
            .map(|col| row.get(col).cloned().unwrap_or(Value::Empty))
            .collect();
        values.push(Value::Text(status.as_str().to_string()));
        values.push(Value::Text(Utc::now().to_rfc3339()));

        let sql = upsert_sql(schema, key_columns);
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Merge fields into an existing row and unconditionally mark it dirty.
    ///
    /// No no-op detection: an update writing identical values still dirties
    /// the row and round-trips through the next sync pass. Returns whether a
    /// row matched the key.
    pub fn update(&self, table: &str, key: &[String], changes: &Row) -> RepositoryResult<bool> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;
        Self::check_key_arity(schema, key_columns, key)?;

        for column in changes.columns() {
            if !schema.columns.iter().any(|c| c == column) {
                return Err(RepositoryError::UnknownColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            }
        }

        // Deterministic SET order: schema declaration order.
        let changed: Vec<&String> = schema
            .columns
            .iter()
            .filter(|col| changes.get(col).is_some())
            .collect();

        let mut assignments: Vec<String> =
            changed.iter().map(|col| format!("{} = ?", quote_ident(col))).collect();
        assignments.push(format!("{} = ?", quote_ident(SYNC_STATUS_COL)));
        assignments.push(format!("{} = ?", quote_ident(UPDATED_AT_COL)));

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(&schema.name),
            assignments.join(", "),
            key_predicate(key_columns),
        );

        let mut values: Vec<Value> = changed
            .iter()
            .filter_map(|col| changes.get(col).cloned())
            .collect();
        values.push(Value::Text(SyncStatus::Dirty.as_str().to_string()));
        values.push(Value::Text(Utc::now().to_rfc3339()));
        values.extend(key.iter().map(|seg| Value::Text(seg.clone())));

        let affected = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(affected > 0)
    }

    /// All dirty rows of a table, full business columns.
    pub fn get_dirty(&self, table: &str) -> RepositoryResult<Vec<Row>> {
        let schema = self.schema(table)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?",
            select_list(schema),
            quote_ident(&schema.name),
            quote_ident(SYNC_STATUS_COL),
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let columns = schema.columns.clone();
        let rows = stmt
            .query_map([SyncStatus::Dirty.as_str()], |r| row_from_sql(&columns, r))?
            .collect::<Result<Vec<Row>, _>>()?;
        Ok(rows)
    }

    /// Mark the row matching the (possibly composite) key clean.
    pub fn mark_clean(&self, table: &str, key: &[String]) -> RepositoryResult<()> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;
        Self::check_key_arity(schema, key_columns, key)?;

        let sql = format!(
            "UPDATE {} SET {} = ?, {} = ? WHERE {}",
            quote_ident(&schema.name),
            quote_ident(SYNC_STATUS_COL),
            quote_ident(UPDATED_AT_COL),
            key_predicate(key_columns),
        );

        let mut values: Vec<Value> = vec![
            Value::Text(SyncStatus::Clean.as_str().to_string()),
            Value::Text(Utc::now().to_rfc3339()),
        ];
        values.extend(key.iter().map(|seg| Value::Text(seg.clone())));

        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Fetch a row by its (possibly composite) primary key.
    pub fn get_by_key(&self, table: &str, key: &[String]) -> RepositoryResult<Option<Row>> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;
        Self::check_key_arity(schema, key_columns, key)?;

        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            select_list(schema),
            quote_ident(&schema.name),
            key_predicate(key_columns),
        );

        let values: Vec<Value> = key.iter().map(|seg| Value::Text(seg.clone())).collect();
        let columns = schema.columns.clone();
        let row = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |r| {
                row_from_sql(&columns, r)
            })
            .optional()?;
        Ok(row)
    }

    /// The persisted sync status of a row, if the row exists.
    pub fn sync_status(&self, table: &str, key: &[String]) -> RepositoryResult<Option<SyncStatus>> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;
        Self::check_key_arity(schema, key_columns, key)?;

        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            quote_ident(SYNC_STATUS_COL),
            quote_ident(&schema.name),
            key_predicate(key_columns),
        );
        let values: Vec<Value> = key.iter().map(|seg| Value::Text(seg.clone())).collect();
        let raw: Option<String> = self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |r| r.get(0))
            .optional()?;

        match raw {
            None => Ok(None),
            Some(s) => SyncStatus::parse(&s).map(Some).ok_or_else(|| {
                RepositoryError::Corrupted(format!("invalid sync status '{s}' in table '{table}'"))
            }),
        }
    }

    /// The audit timestamp of a row, if the row exists.
    pub fn updated_at(&self, table: &str, key: &[String]) -> RepositoryResult<Option<String>> {
        let schema = self.schema(table)?;
        let key_columns = self.key_columns(schema)?;
        Self::check_key_arity(schema, key_columns, key)?;

        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            quote_ident(UPDATED_AT_COL),
            quote_ident(&schema.name),
            key_predicate(key_columns),
        );
        let values: Vec<Value> = key.iter().map(|seg| Value::Text(seg.clone())).collect();
        Ok(self
            .conn
            .query_row(&sql, params_from_iter(values.iter()), |r| r.get(0))
            .optional()?)
    }

    /// Total row count of a table.
    pub fn count(&self, table: &str) -> RepositoryResult<usize> {
        let schema = self.schema(table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&schema.name));
        let n: i64 = self.conn.query_row(&sql, [], |r| r.get(0))?;
        Ok(n as usize)
    }

    /// Number of dirty rows in a table.
    pub fn dirty_count(&self, table: &str) -> RepositoryResult<usize> {
        let schema = self.schema(table)?;
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            quote_ident(&schema.name),
            quote_ident(SYNC_STATUS_COL),
        );
        let n: i64 = self
            .conn
            .query_row(&sql, [SyncStatus::Dirty.as_str()], |r| r.get(0))?;
        Ok(n as usize)
    }
}

/// Quote an identifier from the schema registry for use in SQL text.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Comma-separated quoted business column list.
fn select_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"p1" = ? AND "p2" = ?` predicate over the key columns.
fn key_predicate(key_columns: &[String]) -> String {
    key_columns
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// CREATE TABLE statement for one schema entry.
///
/// Business columns are declared without a type affinity so values keep
/// their native storage class; the primary key is declared when the schema
/// has one so the upsert path has a conflict target.
fn create_table_sql(schema: &TableSchema) -> String {
    let mut defs: Vec<String> = schema.columns.iter().map(|c| quote_ident(c)).collect();
    defs.push(format!(
        "{} TEXT NOT NULL DEFAULT '{}'",
        quote_ident(SYNC_STATUS_COL),
        SyncStatus::Dirty.as_str(),
    ));
    defs.push(format!("{} TEXT NOT NULL DEFAULT ''", quote_ident(UPDATED_AT_COL)));
    if let Some(key) = schema.key_columns() {
        let cols: Vec<String> = key.iter().map(|c| quote_ident(c)).collect();
        defs.push(format!("PRIMARY KEY ({})", cols.join(", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_ident(&schema.name),
        defs.join(", "),
    )
}

/// INSERT ... ON CONFLICT upsert statement for one schema entry.
fn upsert_sql(schema: &TableSchema, key_columns: &[String]) -> String {
    let mut insert_cols: Vec<String> = schema.columns.iter().map(|c| quote_ident(c)).collect();
    insert_cols.push(quote_ident(SYNC_STATUS_COL));
    insert_cols.push(quote_ident(UPDATED_AT_COL));

    let placeholders: Vec<&str> = insert_cols.iter().map(|_| "?").collect();

    let mut updates: Vec<String> = schema
        .columns
        .iter()
        .filter(|c| !key_columns.contains(c))
        .map(|c| format!("{0} = excluded.{0}", quote_ident(c)))
        .collect();
    updates.push(format!("{0} = excluded.{0}", quote_ident(SYNC_STATUS_COL)));
    updates.push(format!("{0} = excluded.{0}", quote_ident(UPDATED_AT_COL)));

    let conflict: Vec<String> = key_columns.iter().map(|c| quote_ident(c)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {}",
        quote_ident(&schema.name),
        insert_cols.join(", "),
        placeholders.join(", "),
        conflict.join(", "),
        updates.join(", "),
    )
}

/// Build a [`Row`] from a result row, in schema column order.
fn row_from_sql(columns: &[String], r: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let mut row = Row::new();
    for (i, col) in columns.iter().enumerate() {
        let value: Value = r.get(i)?;
        row.set(col.clone(), value);
    }
    Ok(row)
}

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
