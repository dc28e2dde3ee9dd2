// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The sweep driver and the accuracy aggregator are written
// against these traits, so the concrete collaborators (IDX
// files, the burn CNN, the on-disk artifact store) can be
// swapped for in-memory fakes in tests.
//
// Implementations:
//   DatasetSource    → data::loader::IdxLoader
//   ModelTrainer     → ml::trainer::BurnTrainer
//   ModelRepository  → infra::artifact_store::ArtifactStore
//   Predictor        → ml::inferencer::Inferencer
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::dataset::{CategoricalLabels, DataSplit, Features};
use crate::domain::history::TrainingHistory;
use crate::domain::key::ModelKey;
use crate::domain::params::ModelParams;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Loads and formats the train/test split. Training and evaluation
/// must go through the same source so the test set is identical.
pub trait DatasetSource {
    fn load(&self) -> Result<DataSplit>;
}

// ─── ModelTrainer ─────────────────────────────────────────────────────────────
/// Encoded training data handed to the trainer for one sweep point
pub struct TrainingData<'a> {
    pub train_x: &'a Features,
    pub train_y: &'a CategoricalLabels,
    pub test_x:  &'a Features,
    pub test_y:  &'a CategoricalLabels,
}

/// Builds a model from `params`, fits it, and persists both the model
/// and its history under `key.storage_name()`.
pub trait ModelTrainer {
    fn fit_and_save(
        &self,
        key:    &ModelKey,
        params: &ModelParams,
        data:   TrainingData<'_>,
    ) -> Result<TrainingHistory>;
}

// ─── Predictor ────────────────────────────────────────────────────────────────
/// A reloaded model that maps images to class indices
pub trait Predictor {
    fn predict_classes(&self, x: &Features) -> Result<Vec<usize>>;
}

// ─── ModelRepository ──────────────────────────────────────────────────────────
/// Read side of the artifact store
pub trait ModelRepository {
    fn load_predictor(&self, key: &ModelKey) -> Result<Box<dyn Predictor>>;

    fn load_history(&self, key: &ModelKey) -> Result<TrainingHistory>;
}
