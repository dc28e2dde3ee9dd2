// ============================================================
// Layer 3 — Training History
// ============================================================
// Per-epoch metrics recorded while fitting one model. The
// history is written next to the model as a JSON side-car and
// read back only to count how many epochs training ran for
// (the convergence grid).
//
// Example side-car:
//   { "acc": [0.81, 0.93], "loss": [0.62, 0.21],
//     "val_acc": [0.95, 0.97], "val_loss": [0.15, 0.09] }

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;

/// Metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Fraction of training samples classified correctly
    pub train_acc: f64,

    /// Average cross-entropy loss on the held-out set
    pub val_loss: f64,

    /// Fraction of held-out samples classified correctly
    pub val_acc: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub acc:      Vec<f64>,
    pub loss:     Vec<f64>,
    pub val_acc:  Vec<f64>,
    pub val_loss: Vec<f64>,
}

impl TrainingHistory {
    pub fn record(&mut self, m: &EpochMetrics) {
        self.acc.push(m.train_acc);
        self.loss.push(m.train_loss);
        self.val_acc.push(m.val_acc);
        self.val_loss.push(m.val_loss);
    }

    /// Number of epochs actually trained
    pub fn epochs(&self) -> usize {
        self.acc.len()
    }

    /// A usable history has at least one epoch and equally long series.
    pub fn validate(&self, name: &str) -> Result<(), HarnessError> {
        let n = self.acc.len();
        if n == 0 {
            return Err(HarnessError::CorruptHistory(name.into(), "no epochs recorded".into()));
        }
        if self.loss.len() != n || self.val_acc.len() != n || self.val_loss.len() != n {
            return Err(HarnessError::CorruptHistory(
                name.into(),
                "metric series have different lengths".into(),
            ));
        }
        Ok(())
    }
}
