// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! depot-sync: reconciliation engine for the depot inventory manager.
//!
//! Keeps the local change-tracked store and the remote tabular store in
//! agreement, in both directions, under the remote provider's request quota.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Orchestrator │────►│ RemoteClient │────►│SheetTransport│
//! │  (per-table  │     │  (batching,  │     │   (trait)    │
//! │ reconcile +  │     │  rate limit) │     └──────────────┘
//! │    sweep)    │     └──────────────┘
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐
//! │  Repository  │  (SQLite, per-row dirty marker)
//! └──────────────┘
//! ```
//!
//! # Features
//!
//! - One full-table snapshot read per table per pass
//! - Dirty rows partitioned into targeted updates vs appends
//! - Fixed-size write chunks paced to stay under the request quota
//! - Per-table failure isolation in the all-tables sweep
//! - Single background worker; concurrent triggers are dropped
//! - Injectable transport and pacer traits for testing

pub mod client;
pub mod orchestrator;
pub mod repository;
pub mod transport;
pub mod worker;

pub use client::{BatchOutcome, DelayPacer, Pacer, RemoteClient, RemoteError, RemoteIndex};
pub use orchestrator::{Orchestrator, SweepReport, SyncError, TableReport};
pub use repository::{Repository, RepositoryError};
pub use transport::{PositionedRow, RawTable, SheetHandle, SheetTransport, TransportError};
pub use worker::{SweepOutcome, SyncWorker};

#[cfg(test)]
mod test_helpers;
