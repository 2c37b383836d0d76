// ============================================================
// Layer 3 - Training History
// ============================================================
// Per-epoch metrics for both splits of one retraining run.
// Used for the accuracy/loss charts and appended to metrics.csv.

use serde::{Deserialize, Serialize};

/// Metrics for a single epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean binary cross-entropy over the training split
    pub loss: f64,

    /// Fraction of training rows classified correctly at the 0.5 threshold
    pub accuracy: f64,

    /// Mean binary cross-entropy over the validation split
    pub val_loss: f64,

    pub val_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss: f64, accuracy: f64, val_loss: f64, val_accuracy: f64) -> Self {
        Self { epoch, loss, accuracy, val_loss, val_accuracy }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, m: EpochMetrics) {
        self.epochs.push(m);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.loss).collect()
    }

    pub fn val_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_loss).collect()
    }

    pub fn accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.accuracy).collect()
    }

    pub fn val_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_accuracy).collect()
    }

    /// Epoch with the lowest validation loss
    pub fn best_epoch(&self) -> Option<&EpochMetrics> {
        let mut best: Option<&EpochMetrics> = None;
        for m in &self.epochs {
            if best.map_or(true, |b| m.is_improvement(b.val_loss)) {
                best = Some(m);
            }
        }
        best
    }
}
