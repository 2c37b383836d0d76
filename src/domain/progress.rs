// ============================================================
// Layer 3 - Training Progress + Cancellation
// ============================================================
// A retraining run reports what it is doing through a channel and
// checks a shared flag between batches so the caller can stop it.
//
//   worker thread ──TrainingEvent──▶ mpsc channel ──▶ CLI
//   CLI ──────────── cancel flag (AtomicBool) ─────▶ worker

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};

use crate::domain::history::EpochMetrics;

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// Data is prepared and the epoch loop is about to start
    Started {
        epochs:     usize,
        train_rows: usize,
        val_rows:   usize,
    },
    EpochFinished(EpochMetrics),
    /// Artifacts were saved under this version
    Saved { version: u64 },
}

/// Cancellation flag + optional progress sender, shared with the worker
#[derive(Debug, Clone, Default)]
pub struct TrainingControl {
    cancel:   Arc<AtomicBool>,
    progress: Option<Sender<TrainingEvent>>,
}

impl TrainingControl {
    pub fn new(cancel: Arc<AtomicBool>, progress: Option<Sender<TrainingEvent>>) -> Self {
        Self { cancel, progress }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Send an event; a receiver that went away is not an error
    pub fn emit(&self, event: TrainingEvent) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(event);
        }
    }
}
