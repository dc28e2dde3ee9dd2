// ============================================================
// Layer 2 — Harness Configuration
// ============================================================
// Everything a workflow needs besides its sweep ranges: where
// the data and models live, the shared training parameters,
// and optional caps on the dataset size for quick runs.
//
// Built from CLI flags (see cli::commands) or loaded whole from
// a JSON file with `--config`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::key::DropoutScalar;
use crate::domain::params::ModelParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub data_dir:      PathBuf,
    pub model_dir:     PathBuf,
    pub n_classes:     usize,
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub patience:      Option<usize>,
    pub seed:          u64,
    /// Use only the first N training examples
    pub train_limit:   Option<usize>,
    /// Use only the first N test examples
    pub test_limit:    Option<usize>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let params = ModelParams::default();
        Self {
            data_dir:      PathBuf::from("data/mnist"),
            model_dir:     PathBuf::from("models"),
            n_classes:     params.n_classes,
            epochs:        params.epochs,
            batch_size:    params.batch_size,
            learning_rate: params.learning_rate,
            patience:      params.patience,
            seed:          params.seed,
            train_limit:   None,
            test_limit:    None,
        }
    }
}

impl HarnessConfig {
    /// Load a full configuration from JSON; absent fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config '{}'", path.display()))
    }

    /// Training parameters shared by every point of a sweep. Image
    /// geometry is filled in from the loaded data.
    pub fn base_params(&self) -> ModelParams {
        ModelParams {
            n_classes:      self.n_classes,
            epochs:         self.epochs,
            batch_size:     self.batch_size,
            dropout_scalar: DropoutScalar::BASE,
            learning_rate:  self.learning_rate,
            patience:       self.patience,
            seed:           self.seed,
            ..ModelParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.json");
        fs::write(&path, r#"{ "epochs": 3, "train_limit": 500 }"#).unwrap();

        let cfg = HarnessConfig::load(&path).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.train_limit, Some(500));
        assert_eq!(cfg.n_classes, 10);
        assert_eq!(cfg.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_base_params_carry_config() {
        let cfg = HarnessConfig { epochs: 5, patience: None, ..Default::default() };
        let params = cfg.base_params();
        assert_eq!(params.epochs, 5);
        assert_eq!(params.patience, None);
        assert_eq!(params.dropout_scalar, DropoutScalar::BASE);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_unknown_file_is_an_error() {
        assert!(HarnessConfig::load(Path::new("/nonexistent/harness.json")).is_err());
    }
}
