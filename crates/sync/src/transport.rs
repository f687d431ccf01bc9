// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the remote tabular store.
//!
//! Any remote store offering these three operations satisfies the contract:
//! a full-table read returning row-ordinal-addressable records, a
//! range-addressed batch update, and a bulk append. One trait call costs
//! exactly one remote request; all chunking and pacing happens above this
//! layer in [`crate::client::RemoteClient`].
//!
//! The trait exists so tests can inject an in-memory sheet, mirroring the
//! production transport's observable behavior without network traffic.

use std::collections::HashMap;

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The remote request failed (network, quota, server error).
    #[error("remote request failed: {0}")]
    Request(String),

    /// The named table does not exist on the remote store.
    #[error("remote table not found: {0}")]
    TableNotFound(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Opaque reference to a remote table, valid for a single sync pass.
///
/// Returned by the snapshot read and handed back to the batched writes so a
/// pass never pays for a second remote lookup. Never cached across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    table: String,
}

impl SheetHandle {
    /// Create a handle for the named remote table.
    pub fn new(table: impl Into<String>) -> Self {
        SheetHandle { table: table.into() }
    }

    /// The remote table this handle refers to.
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// One full-table snapshot as returned by the remote store.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Handle for subsequent writes within the same pass.
    pub handle: SheetHandle,
    /// Records in remote ordinal order, keyed by remote column name.
    pub records: Vec<HashMap<String, String>>,
}

/// A full row destined for a specific remote ordinal position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedRow {
    /// Zero-based ordinal within the snapshot this pass read.
    pub position: usize,
    /// Every cell of the row, in schema column order.
    pub cells: Vec<String>,
}

/// The remote tabular API. One method call is one remote request.
pub trait SheetTransport: Send {
    /// Read the entire table in a single request.
    fn fetch_table(&mut self, table: &str) -> TransportResult<RawTable>;

    /// Write full rows at their recorded ordinal positions in one request.
    fn update_rows(&mut self, handle: &SheetHandle, rows: &[PositionedRow]) -> TransportResult<()>;

    /// Append full rows after the last remote row in one request.
    fn append_rows(&mut self, handle: &SheetHandle, rows: &[Vec<String>]) -> TransportResult<()>;
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
