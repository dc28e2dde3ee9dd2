// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Every trained sweep point leaves three files in the model
// directory, all named after ModelKey::storage_name():
//
//   models/
//     <name>.mpk           ← weights (burn CompactRecorder)
//     <name>.params.json   ← ModelParams, to rebuild the network
//     <name>.history.json  ← per-epoch acc / loss / val_acc / val_loss
//
// Storage names contain dots ("NoiseCnn_v.0.1_y_0.05"), and the
// recorder replaces whatever it thinks the extension is, so the
// model path is always handed over with its ".mpk" suffix
// already in place.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    backend::ndarray::NdArrayDevice,
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::domain::history::TrainingHistory;
use crate::domain::key::ModelKey;
use crate::domain::params::ModelParams;
use crate::domain::traits::{ModelRepository, Predictor};
use crate::ml::inferencer::Inferencer;
use crate::ml::model::{NoiseCnn, NoiseCnnConfig};
use crate::ml::trainer::InnerBackend;

/// Reads and writes model artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) the artifact directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path handed to the recorder. Without the suffix it would cut
    /// the name at the last dot of the float.
    fn model_path(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(format!("{}.mpk", key.storage_name()))
    }

    fn params_path(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(format!("{}.params.json", key.storage_name()))
    }

    fn history_path(&self, key: &ModelKey) -> PathBuf {
        self.dir.join(format!("{}.history.json", key.storage_name()))
    }

    pub fn save_model<B: Backend>(&self, key: &ModelKey, model: &NoiseCnn<B>) -> Result<()> {
        let path = self.model_path(key);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;
        tracing::debug!("Saved weights for '{}'", key.storage_name());
        Ok(())
    }

    /// Rebuild the network from its params side-car, then load the weights.
    pub fn load_model<B: Backend>(&self, key: &ModelKey, device: &B::Device) -> Result<NoiseCnn<B>> {
        let (model, _) = self.load_model_with_params(key, device)?;
        Ok(model)
    }

    fn load_model_with_params<B: Backend>(
        &self,
        key:    &ModelKey,
        device: &B::Device,
    ) -> Result<(NoiseCnn<B>, ModelParams)> {
        let params = self.load_params(key)?;
        let model: NoiseCnn<B> = NoiseCnnConfig::from_params(&params).init(device);

        let path = self.model_path(key);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Has this point been trained?", path.display())
            })?;
        Ok((model.load_record(record), params))
    }

    pub fn save_params(&self, key: &ModelKey, params: &ModelParams) -> Result<()> {
        let path = self.params_path(key);
        let json = serde_json::to_string_pretty(params)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write params to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_params(&self, key: &ModelKey) -> Result<ModelParams> {
        let path = self.params_path(key);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read params from '{}'", path.display()))?;
        let params: ModelParams = serde_json::from_str(&json)
            .with_context(|| format!("Malformed params in '{}'", path.display()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn save_history(&self, key: &ModelKey, history: &TrainingHistory) -> Result<()> {
        let path = self.history_path(key);
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write history to '{}'", path.display()))?;
        Ok(())
    }

    /// Missing, unparsable or empty histories are all errors.
    pub fn load_history(&self, key: &ModelKey) -> Result<TrainingHistory> {
        let path = self.history_path(key);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read history from '{}'", path.display()))?;
        let history: TrainingHistory = serde_json::from_str(&json)
            .with_context(|| format!("Malformed history in '{}'", path.display()))?;
        history.validate(&key.storage_name())?;
        Ok(history)
    }
}

impl ModelRepository for ArtifactStore {
    fn load_predictor(&self, key: &ModelKey) -> Result<Box<dyn Predictor>> {
        let device = NdArrayDevice::default();
        let (model, params) = self.load_model_with_params::<InnerBackend>(key, &device)?;
        tracing::debug!("Loaded model '{}'", key.storage_name());
        Ok(Box::new(Inferencer::new(model, params.image_height, params.image_width)))
    }

    fn load_history(&self, key: &ModelKey) -> Result<TrainingHistory> {
        ArtifactStore::load_history(self, key)
    }
}
