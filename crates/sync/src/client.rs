// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Rate-limit-aware client for the remote tabular store.
//!
//! The whole design exists to preserve one property: a table sync costs O(1)
//! remote read requests regardless of table size. [`RemoteClient::read_all`]
//! takes a single snapshot and builds the composite-key index that routes
//! every subsequent write; the batched writes slice their input into
//! fixed-size chunks and pause between chunks (never before the first or
//! after the last) to stay under the provider's per-minute request quota.
//!
//! There is no retry or backoff: a failed chunk aborts the remaining chunks
//! and the error propagates to the orchestrator, which fails the table.

use std::collections::HashMap;
use std::time::Duration;

use depot_core::{Row, SyncTuning, TableSchema, Value};

use crate::transport::{PositionedRow, SheetHandle, SheetTransport, TransportError};

/// Ephemeral mapping from composite key to remote ordinal position.
///
/// Built once per table per pass; a key routes an update to the position the
/// same pass's snapshot recorded, never a stale one.
pub type RemoteIndex = HashMap<String, usize>;

/// Error type for remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The full-table snapshot read failed.
    #[error("remote read of table '{table}' failed: {source}")]
    Read {
        table: String,
        source: TransportError,
    },

    /// A batched update/append chunk failed; remaining chunks were aborted.
    #[error("remote write to table '{table}' failed: {source}")]
    Write {
        table: String,
        source: TransportError,
    },
}

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Counts reported by a batched update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Rows written to the remote store.
    pub written: usize,
    /// Rows skipped because their key was absent from the pass's index.
    pub skipped: usize,
}

/// Inter-chunk pacing seam.
///
/// Production uses [`DelayPacer`]; tests inject a counting pacer to assert
/// the pause-between-chunks discipline without sleeping.
pub trait Pacer: Send {
    /// Block until the next write request may be issued.
    fn pause(&mut self);
}

/// Pacer that sleeps the configured rate-limit window on the calling thread.
#[derive(Debug, Clone)]
pub struct DelayPacer {
    delay: Duration,
}

impl DelayPacer {
    /// Create a pacer sleeping `delay` between chunks.
    pub fn new(delay: Duration) -> Self {
        DelayPacer { delay }
    }
}

impl Pacer for DelayPacer {
    fn pause(&mut self) {
        std::thread::sleep(self.delay);
    }
}

/// Batching client over a [`SheetTransport`].
pub struct RemoteClient<T: SheetTransport, P: Pacer = DelayPacer> {
    transport: T,
    pacer: P,
    chunk_size: usize,
}

impl<T: SheetTransport> RemoteClient<T, DelayPacer> {
    /// Create a client with the configured chunk size and inter-chunk delay.
    pub fn new(transport: T, tuning: &SyncTuning) -> Self {
        RemoteClient {
            transport,
            pacer: DelayPacer::new(tuning.chunk_delay()),
            chunk_size: tuning.chunk_size.max(1),
        }
    }
}

impl<T: SheetTransport, P: Pacer> RemoteClient<T, P> {
    /// Create a client with a custom pacer (for testing).
    pub fn with_pacer(transport: T, chunk_size: usize, pacer: P) -> Self {
        RemoteClient {
            transport,
            pacer,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Read the full remote table in exactly one request.
    ///
    /// Each record is shaped by reading every schema column; columns the
    /// remote store does not carry default to the empty string, and every
    /// value is trimmed. The returned index maps each non-empty composite
    /// key to its remote ordinal; rows whose key columns are all empty are
    /// left out of the index entirely.
    pub fn read_all(
        &mut self,
        schema: &TableSchema,
    ) -> RemoteResult<(Vec<Row>, RemoteIndex, SheetHandle)> {
        let raw = self
            .transport
            .fetch_table(&schema.name)
            .map_err(|source| RemoteError::Read {
                table: schema.name.clone(),
                source,
            })?;

        let key_columns: &[String] = schema.key_columns().unwrap_or(&[]);
        let mut rows = Vec::with_capacity(raw.records.len());
        let mut index = RemoteIndex::new();

        for (position, record) in raw.records.iter().enumerate() {
            let row: Row = schema
                .columns
                .iter()
                .map(|col| {
                    let cell = record.get(col).map(|v| v.trim().to_string()).unwrap_or_default();
                    (col.clone(), Value::Text(cell))
                })
                .collect();

            if let Some(key) = row.composite_key(key_columns) {
                // Last occurrence wins, matching remote ordinal resolution.
                index.insert(key, position);
            }
            rows.push(row);
        }

        tracing::debug!(
            table = %schema.name,
            rows = rows.len(),
            indexed = index.len(),
            "remote snapshot read"
        );
        Ok((rows, index, raw.handle))
    }

    /// Write full rows to the remote positions recorded in `index`.
    ///
    /// Rows whose composite key is not in the index became stale between the
    /// snapshot read and this write; they are skipped with a warning, never
    /// silently dropped and never escalated to a failure. Every column is
    /// rewritten; there is no field-level diffing.
    pub fn batch_update(
        &mut self,
        schema: &TableSchema,
        handle: &SheetHandle,
        index: &RemoteIndex,
        rows: &[Row],
    ) -> RemoteResult<BatchOutcome> {
        let key_columns: &[String] = schema.key_columns().unwrap_or(&[]);
        let mut targets = Vec::with_capacity(rows.len());
        let mut skipped = 0;

        for row in rows {
            let Some(key) = row.composite_key(key_columns) else {
                skipped += 1;
                tracing::warn!(table = %schema.name, "row with empty key reached update, skipping");
                continue;
            };
            match index.get(&key) {
                Some(&position) => targets.push(PositionedRow {
                    position,
                    cells: shape_cells(schema, row),
                }),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        table = %schema.name,
                        key = %key,
                        "dirty row absent from remote snapshot, skipping update"
                    );
                }
            }
        }

        for (i, chunk) in targets.chunks(self.chunk_size).enumerate() {
            if i > 0 {
                self.pacer.pause();
            }
            self.transport
                .update_rows(handle, chunk)
                .map_err(|source| RemoteError::Write {
                    table: schema.name.clone(),
                    source,
                })?;
            tracing::debug!(table = %schema.name, chunk = i, rows = chunk.len(), "update chunk written");
        }

        Ok(BatchOutcome {
            written: targets.len(),
            skipped,
        })
    }

    /// Append rows that have no existing remote position.
    ///
    /// Same chunking and pacing discipline as [`Self::batch_update`].
    pub fn batch_append(
        &mut self,
        schema: &TableSchema,
        handle: &SheetHandle,
        rows: &[Row],
    ) -> RemoteResult<usize> {
        let shaped: Vec<Vec<String>> = rows.iter().map(|row| shape_cells(schema, row)).collect();

        for (i, chunk) in shaped.chunks(self.chunk_size).enumerate() {
            if i > 0 {
                self.pacer.pause();
            }
            self.transport
                .append_rows(handle, chunk)
                .map_err(|source| RemoteError::Write {
                    table: schema.name.clone(),
                    source,
                })?;
            tracing::debug!(table = %schema.name, chunk = i, rows = chunk.len(), "append chunk written");
        }

        Ok(shaped.len())
    }
}

/// Shape a row into the full remote cell list, in schema column order.
fn shape_cells(schema: &TableSchema, row: &Row) -> Vec<String> {
    schema.columns.iter().map(|col| row.cell(col)).collect()
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
