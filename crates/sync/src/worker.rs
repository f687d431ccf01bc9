// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background sync worker.
//!
//! Sync never runs on the caller's thread: the rate-limit pauses between
//! write chunks are blocking sleeps and would freeze interactive use. One
//! dedicated thread owns the orchestrator for its whole life; at most one
//! sweep is in flight at a time, enforced with an atomic running flag. A
//! trigger arriving while a sweep runs is dropped, not deferred; there is
//! no trigger queue.
//!
//! There is no mid-pass cancellation. Dropping the [`SyncWorker`] closes the
//! trigger channel; the thread exits after finishing any sweep already in
//! flight, so shutdown only ever lands between passes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::client::Pacer;
use crate::orchestrator::{Orchestrator, SweepReport, SyncError};
use crate::transport::SheetTransport;

/// Outcome of one completed sweep.
pub type SweepOutcome = Result<SweepReport, SyncError>;

/// Handle to the dedicated sync thread.
pub struct SyncWorker {
    trigger_tx: Option<Sender<()>>,
    outcome_rx: Receiver<SweepOutcome>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Spawn the worker thread, moving the orchestrator into it.
    pub fn spawn<T, P>(mut orchestrator: Orchestrator<T, P>) -> std::io::Result<Self>
    where
        T: SheetTransport + 'static,
        P: Pacer + 'static,
    {
        let (trigger_tx, trigger_rx) = mpsc::channel::<()>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<SweepOutcome>();
        let running = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&running);

        let thread = std::thread::Builder::new()
            .name("depot-sync".to_string())
            .spawn(move || {
                // Channel closes when the handle drops; the loop then ends.
                while trigger_rx.recv().is_ok() {
                    tracing::info!("sync pass starting");
                    let outcome = orchestrator.sync_all();
                    if let Err(ref e) = outcome {
                        tracing::warn!(error = %e, "sync pass finished with failures");
                    } else {
                        tracing::info!("sync pass finished");
                    }
                    // Clear the flag before delivery so a caller reacting to
                    // the outcome can immediately trigger the next pass.
                    flag.store(false, Ordering::SeqCst);
                    let _ = outcome_tx.send(outcome);
                }
            })?;

        Ok(SyncWorker {
            trigger_tx: Some(trigger_tx),
            outcome_rx,
            running,
            thread: Some(thread),
        })
    }

    /// Request a sweep.
    ///
    /// Returns `true` when a pass was started, `false` when one was already
    /// in flight and the trigger was dropped.
    pub fn trigger(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("sync already running, trigger dropped");
            return false;
        }
        match &self.trigger_tx {
            Some(tx) if tx.send(()).is_ok() => true,
            _ => {
                self.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Whether a sweep is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the next sweep outcome arrives.
    ///
    /// Returns `None` once the worker thread has exited.
    pub fn wait_outcome(&self) -> Option<SweepOutcome> {
        self.outcome_rx.recv().ok()
    }

    /// Fetch a sweep outcome without blocking.
    pub fn try_outcome(&self) -> Option<SweepOutcome> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        // Close the trigger channel, then wait for the thread to finish any
        // in-flight sweep.
        self.trigger_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
