// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the background sync worker.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

use depot_core::SyncMode;

use super::SyncWorker;
use crate::client::RemoteClient;
use crate::orchestrator::{Orchestrator, SyncError};
use crate::repository::Repository;
use crate::test_helpers::{registry, schema, CountingPacer, MemorySheet};
use crate::transport::{
    PositionedRow, RawTable, SheetHandle, SheetTransport, TransportResult,
};

/// Transport whose fetch blocks until the test releases it, pinning the
/// worker inside a pass.
struct GatedSheet {
    gate: Arc<Mutex<mpsc::Receiver<()>>>,
}

impl GatedSheet {
    fn new() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            GatedSheet {
                gate: Arc::new(Mutex::new(rx)),
            },
            tx,
        )
    }
}

impl SheetTransport for GatedSheet {
    fn fetch_table(&mut self, table: &str) -> TransportResult<RawTable> {
        let _ = self.gate.lock().unwrap().recv();
        Ok(RawTable {
            handle: SheetHandle::new(table),
            records: Vec::new(),
        })
    }

    fn update_rows(&mut self, _: &SheetHandle, _: &[PositionedRow]) -> TransportResult<()> {
        Ok(())
    }

    fn append_rows(&mut self, _: &SheetHandle, _: &[Vec<String>]) -> TransportResult<()> {
        Ok(())
    }
}

fn one_table_registry() -> Arc<depot_core::SchemaRegistry> {
    registry(vec![schema(
        "equipment",
        &["id"],
        &["id", "model"],
        SyncMode::Bidirectional,
    )])
}

#[test]
fn test_trigger_runs_a_pass_and_delivers_outcome() {
    let reg = one_table_registry();
    let (sheet, state) = MemorySheet::new();
    state
        .lock()
        .unwrap()
        .insert_table("equipment", &["id", "model"], &[&["E1", "drill"]]);
    let (pacer, _) = CountingPacer::new();
    let client = RemoteClient::with_pacer(sheet, 50, pacer);
    let repo = Repository::open_in_memory(Arc::clone(&reg)).unwrap();
    let worker = SyncWorker::spawn(Orchestrator::new(reg, repo, client)).unwrap();

    assert!(!worker.is_running());
    assert!(worker.try_outcome().is_none());
    assert!(worker.trigger());

    let outcome = worker.wait_outcome().unwrap();
    let report = outcome.unwrap();
    assert_eq!(report.tables.len(), 1);
    assert_eq!(report.tables[0].pulled, 1);
    assert!(!worker.is_running());
}

#[test]
fn test_second_trigger_during_pass_is_dropped_not_queued() {
    let reg = one_table_registry();
    let (sheet, gate) = GatedSheet::new();
    let (pacer, _) = CountingPacer::new();
    let client = RemoteClient::with_pacer(sheet, 50, pacer);
    let repo = Repository::open_in_memory(Arc::clone(&reg)).unwrap();
    let worker = SyncWorker::spawn(Orchestrator::new(reg, repo, client)).unwrap();

    assert!(worker.trigger());
    assert!(worker.is_running());

    // Pass is pinned inside the remote read; concurrent triggers drop.
    assert!(!worker.trigger());
    assert!(!worker.trigger());

    gate.send(()).unwrap();
    assert!(worker.wait_outcome().unwrap().is_ok());

    // Exactly one pass ran: the dropped triggers were not deferred.
    assert!(worker.try_outcome().is_none());
    assert!(!worker.is_running());

    // A fresh trigger after completion starts a new pass.
    assert!(worker.trigger());
    gate.send(()).unwrap();
    assert!(worker.wait_outcome().unwrap().is_ok());
}

#[test]
fn test_failed_sweep_outcome_is_delivered() {
    let reg = one_table_registry();
    let (sheet, state) = MemorySheet::new();
    state.lock().unwrap().fail_fetch = Some("equipment".to_string());
    state
        .lock()
        .unwrap()
        .insert_table("equipment", &["id", "model"], &[]);
    let (pacer, _) = CountingPacer::new();
    let client = RemoteClient::with_pacer(sheet, 50, pacer);
    let repo = Repository::open_in_memory(Arc::clone(&reg)).unwrap();
    let worker = SyncWorker::spawn(Orchestrator::new(reg, repo, client)).unwrap();

    assert!(worker.trigger());
    let outcome = worker.wait_outcome().unwrap();
    match outcome {
        Err(SyncError::SweepFailed { tables }) => {
            assert_eq!(tables, vec!["equipment".to_string()]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // A failed pass releases the running flag like a successful one.
    assert!(!worker.is_running());
    assert!(worker.trigger());
}

#[test]
fn test_drop_shuts_worker_down_between_passes() {
    let reg = one_table_registry();
    let (sheet, state) = MemorySheet::new();
    state
        .lock()
        .unwrap()
        .insert_table("equipment", &["id", "model"], &[]);
    let (pacer, _) = CountingPacer::new();
    let client = RemoteClient::with_pacer(sheet, 50, pacer);
    let repo = Repository::open_in_memory(Arc::clone(&reg)).unwrap();
    let worker = SyncWorker::spawn(Orchestrator::new(reg, repo, client)).unwrap();

    assert!(worker.trigger());
    let _ = worker.wait_outcome();
    drop(worker); // joins the thread; must not hang
}
