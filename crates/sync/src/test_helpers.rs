// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the sync engine tests.
//!
//! [`MemorySheet`] is an in-memory [`SheetTransport`] backed by shared state
//! so tests keep a handle to the fake remote store after the transport moves
//! into a client or orchestrator. [`CountingPacer`] counts inter-chunk
//! pauses instead of sleeping.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use depot_core::{PrimaryKey, Row, SchemaRegistry, SyncMode, TableSchema};

use crate::client::Pacer;
use crate::transport::{
    PositionedRow, RawTable, SheetHandle, SheetTransport, TransportError, TransportResult,
};

/// One fake remote table: a header and a grid of cells.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Shared state of the fake remote store.
#[derive(Debug, Default)]
pub struct SheetState {
    pub tables: HashMap<String, SheetData>,
    pub fetch_calls: usize,
    /// (table, rows-in-request) per update request.
    pub update_calls: Vec<(String, usize)>,
    /// (table, rows-in-request) per append request.
    pub append_calls: Vec<(String, usize)>,
    /// Table whose fetch fails.
    pub fail_fetch: Option<String>,
    /// Table whose updates fail.
    pub fail_update: Option<String>,
    /// Table whose appends fail.
    pub fail_append: Option<String>,
}

impl SheetState {
    /// Register a table with a header and initial rows.
    pub fn insert_table(&mut self, name: &str, columns: &[&str], rows: &[&[&str]]) {
        self.tables.insert(
            name.to_string(),
            SheetData {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: rows
                    .iter()
                    .map(|r| r.iter().map(|c| c.to_string()).collect())
                    .collect(),
            },
        );
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|t| t.rows.len()).unwrap_or(0)
    }

    /// Cell value addressed by row ordinal and column name.
    pub fn cell(&self, table: &str, row: usize, column: &str) -> String {
        let data = self.tables.get(table).unwrap();
        let idx = data.columns.iter().position(|c| c == column).unwrap();
        data.rows[row].get(idx).cloned().unwrap_or_default()
    }

    /// Total write requests (updates + appends) issued so far.
    pub fn write_requests(&self) -> usize {
        self.update_calls.len() + self.append_calls.len()
    }
}

/// In-memory transport over shared [`SheetState`].
pub struct MemorySheet {
    state: Arc<Mutex<SheetState>>,
}

impl MemorySheet {
    /// Create a transport and the shared handle to its state.
    pub fn new() -> (Self, Arc<Mutex<SheetState>>) {
        let state = Arc::new(Mutex::new(SheetState::default()));
        (
            MemorySheet {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl SheetTransport for MemorySheet {
    fn fetch_table(&mut self, table: &str) -> TransportResult<RawTable> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.fail_fetch.as_deref() == Some(table) {
            return Err(TransportError::Request("injected fetch failure".to_string()));
        }
        let data = state
            .tables
            .get(table)
            .ok_or_else(|| TransportError::TableNotFound(table.to_string()))?;

        let records = data
            .rows
            .iter()
            .map(|row| {
                data.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| (c.clone(), v.clone()))
                    .collect::<HashMap<String, String>>()
            })
            .collect();

        Ok(RawTable {
            handle: SheetHandle::new(table),
            records,
        })
    }

    fn update_rows(&mut self, handle: &SheetHandle, rows: &[PositionedRow]) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update.as_deref() == Some(handle.table()) {
            return Err(TransportError::Request("injected update failure".to_string()));
        }
        state
            .update_calls
            .push((handle.table().to_string(), rows.len()));
        let data = state
            .tables
            .get_mut(handle.table())
            .ok_or_else(|| TransportError::TableNotFound(handle.table().to_string()))?;
        for row in rows {
            if row.position >= data.rows.len() {
                return Err(TransportError::Request(format!(
                    "position {} out of range",
                    row.position
                )));
            }
            data.rows[row.position] = row.cells.clone();
        }
        Ok(())
    }

    fn append_rows(&mut self, handle: &SheetHandle, rows: &[Vec<String>]) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_append.as_deref() == Some(handle.table()) {
            return Err(TransportError::Request("injected append failure".to_string()));
        }
        state
            .append_calls
            .push((handle.table().to_string(), rows.len()));
        let data = state
            .tables
            .get_mut(handle.table())
            .ok_or_else(|| TransportError::TableNotFound(handle.table().to_string()))?;
        data.rows.extend(rows.iter().cloned());
        Ok(())
    }
}

/// Pacer that counts pauses instead of sleeping.
pub struct CountingPacer {
    pauses: Arc<AtomicUsize>,
}

impl CountingPacer {
    /// Create a pacer and the shared pause counter.
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let pauses = Arc::new(AtomicUsize::new(0));
        (
            CountingPacer {
                pauses: Arc::clone(&pauses),
            },
            pauses,
        )
    }
}

impl Pacer for CountingPacer {
    fn pause(&mut self) {
        self.pauses.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Build a table schema from string slices.
pub fn schema(name: &str, key: &[&str], columns: &[&str], mode: SyncMode) -> TableSchema {
    TableSchema {
        name: name.to_string(),
        primary_key: if key.is_empty() {
            None
        } else {
            Some(PrimaryKey::new(key.iter().map(|c| c.to_string()).collect()))
        },
        columns: columns.iter().map(|c| c.to_string()).collect(),
        mode,
    }
}

/// Build a registry from schemas.
pub fn registry(tables: Vec<TableSchema>) -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new(tables).unwrap())
}

/// Build a row from (column, value) pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    let mut row = Row::new();
    for (column, value) in pairs {
        row.set(*column, *value);
    }
    row
}
