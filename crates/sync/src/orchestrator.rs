// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-table reconciliation and the all-tables sweep.
//!
//! One table's sync is the sequence read-remote → push → mark-clean →
//! pull-new; any I/O failure fails the table. Push always precedes pull.
//! Pull only ever adds rows that do not yet exist locally; existing local
//! rows are never overwritten by remote values, so local edits always win
//! for rows present on both sides. A consequence the design accepts: a row
//! edited only remotely after it already exists locally never propagates
//! down.
//!
//! The sweep runs tables strictly sequentially with per-table failure
//! isolation: a failed table is logged and recorded, the sweep continues,
//! and an aggregate error naming every failed table is returned at the end.

use serde::Serialize;
use std::sync::Arc;

use depot_core::{Row, SchemaRegistry, SyncMode, SyncStatus};

use crate::client::{Pacer, RemoteClient, RemoteError};
use crate::repository::{Repository, RepositoryError};
use crate::transport::SheetTransport;

/// Error type for orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Table name not found in the schema registry.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// Table is excluded from sync or declares no primary key.
    #[error("table '{0}' is not configured for sync")]
    NotSyncable(String),

    /// Local storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Remote read or write failure.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// One or more tables failed during the sweep; every other table was
    /// still attempted.
    #[error("sync failed for tables: {}", .tables.join(", "))]
    SweepFailed { tables: Vec<String> },
}

/// Result type for orchestrator operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Counts for one reconciled table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name.
    pub table: String,
    /// Dirty rows written to existing remote positions.
    pub updated: usize,
    /// Dirty rows appended as new remote rows.
    pub appended: usize,
    /// Dirty rows skipped because their key left the remote snapshot.
    pub stale_skipped: usize,
    /// Remote rows inserted locally (pre-marked clean).
    pub pulled: usize,
}

impl TableReport {
    fn new(table: &str) -> Self {
        TableReport {
            table: table.to_string(),
            ..TableReport::default()
        }
    }
}

/// Counts for one full sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Per-table reports, in sweep order.
    pub tables: Vec<TableReport>,
}

/// Drives read-reconcile-write for every configured table.
pub struct Orchestrator<T: SheetTransport, P: Pacer> {
    registry: Arc<SchemaRegistry>,
    repository: Repository,
    client: RemoteClient<T, P>,
}

impl<T: SheetTransport, P: Pacer> Orchestrator<T, P> {
    /// Create an orchestrator over an already-opened repository and client.
    pub fn new(
        registry: Arc<SchemaRegistry>,
        repository: Repository,
        client: RemoteClient<T, P>,
    ) -> Self {
        Orchestrator {
            registry,
            repository,
            client,
        }
    }

    /// Read-only access to the underlying repository.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Reconcile one table.
    pub fn sync_table(&mut self, name: &str) -> SyncResult<TableReport> {
        let schema = self
            .registry
            .get(name)
            .ok_or_else(|| SyncError::UnknownTable(name.to_string()))?
            .clone();
        if !schema.is_syncable() {
            return Err(SyncError::NotSyncable(name.to_string()));
        }
        let key_columns: Vec<String> = schema
            .key_columns()
            .ok_or_else(|| SyncError::NotSyncable(name.to_string()))?
            .to_vec();

        // One snapshot per pass; the handle and index never outlive it.
        let (remote_rows, index, handle) = self.client.read_all(&schema)?;
        let mut report = TableReport::new(name);

        if schema.mode == SyncMode::Bidirectional {
            let dirty = self.repository.get_dirty(name)?;

            let mut to_update: Vec<Row> = Vec::new();
            let mut to_append: Vec<Row> = Vec::new();
            for row in dirty {
                // Rows with no usable identity stay local and stay dirty.
                let Some(key) = row.composite_key(&key_columns) else {
                    continue;
                };
                if index.contains_key(&key) {
                    to_update.push(row);
                } else {
                    to_append.push(row);
                }
            }

            if !to_update.is_empty() {
                let outcome = self.client.batch_update(&schema, &handle, &index, &to_update)?;
                report.updated = outcome.written;
                report.stale_skipped = outcome.skipped;
            }
            if !to_append.is_empty() {
                report.appended = self.client.batch_append(&schema, &handle, &to_append)?;
            }

            // Every partitioned row is marked clean, including rows
            // batch_update skipped for a stale key: a skipped row is treated
            // as synced on the next pass. Accepted risk of silent loss.
            for row in to_update.iter().chain(to_append.iter()) {
                self.repository.mark_clean(name, &row.key_segments(&key_columns))?;
            }
        }

        // Pull phase: only brand-new remote rows flow downward.
        for row in &remote_rows {
            if row.composite_key(&key_columns).is_none() {
                continue;
            }
            let segments = row.key_segments(&key_columns);
            if self.repository.get_by_key(name, &segments)?.is_none() {
                self.repository.insert(name, row, SyncStatus::Clean)?;
                report.pulled += 1;
            }
        }

        tracing::info!(
            table = %name,
            updated = report.updated,
            appended = report.appended,
            stale_skipped = report.stale_skipped,
            pulled = report.pulled,
            "table synced"
        );
        Ok(report)
    }

    /// Reconcile every syncable table, strictly sequentially.
    ///
    /// Tables with `SyncMode::Excluded` or no primary key are skipped
    /// entirely. Per-table failures are isolated; after every table has been
    /// attempted, a sweep with any failure returns
    /// [`SyncError::SweepFailed`] naming exactly the failed tables.
    pub fn sync_all(&mut self) -> SyncResult<SweepReport> {
        let names: Vec<String> = self
            .registry
            .tables()
            .iter()
            .filter(|s| s.is_syncable())
            .map(|s| s.name.clone())
            .collect();

        let mut report = SweepReport::default();
        let mut failed: Vec<String> = Vec::new();

        for name in names {
            match self.sync_table(&name) {
                Ok(table_report) => report.tables.push(table_report),
                Err(e) => {
                    tracing::warn!(table = %name, error = %e, "table sync failed, continuing sweep");
                    failed.push(name);
                }
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(SyncError::SweepFailed { tables: failed })
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
