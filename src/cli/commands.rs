// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// One subcommand per workflow, plus the shared harness flags.
//
// Ranges are given either as explicit comma-separated values
// (`--values 0,50,100`) or as `--linspace START,STOP,NUM`;
// each command falls back to its usual range when neither is
// given.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::config::HarnessConfig;
use crate::domain::key::NoiseAxis;
use crate::domain::mesh::{linspace, MeshRanges};

/// Feature-noise stddevs used when no range is given
pub const DEFAULT_STDDEVS: (f64, f64, usize) = (0.0, 192.0, 97);

/// Label-noise fractions used when no range is given
pub const DEFAULT_FRACTIONS: (f64, f64, usize) = (0.0, 0.8, 17);

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the first training image of each class under increasing noise
    ShowNoisyX(ShowNoisyArgs),

    /// Train the whole mesh, then save its accuracy grid
    SaveAccMesh(SaveMeshArgs),

    /// Save the epochs-to-converge grid of an already trained mesh
    SaveConvergeMesh(SaveMeshArgs),

    /// Plot a saved accuracy grid as a 3-D surface
    PlotAccMesh(PlotMeshArgs),

    /// Train one model per noise value along a single axis
    TrainAxis(AxisArgs),

    /// Per-class accuracy of feature-noise models
    Classwise(ClasswiseArgs),

    /// Overall accuracy of models along a single axis
    RawAcc(RawAccArgs),
}

// ─── Shared flags ─────────────────────────────────────────────────────────────
/// Flags that override the harness configuration. Unset flags keep
/// the value from `--config` (or the built-in default).
#[derive(Args, Debug, Clone, Default)]
pub struct HarnessArgs {
    /// JSON file with a full harness configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the four IDX files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory for model weights, params and histories
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    pub n_classes: Option<usize>,

    /// Maximum epochs per model
    #[arg(long, global = true)]
    pub epochs: Option<usize>,

    /// Batch size for single-axis sweeps (the mesh sets its own)
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    #[arg(long, global = true)]
    pub learning_rate: Option<f64>,

    /// Epochs without validation-loss improvement before stopping
    #[arg(long, global = true, conflicts_with = "no_early_stopping")]
    pub patience: Option<usize>,

    /// Always train for the full number of epochs
    #[arg(long, global = true)]
    pub no_early_stopping: bool,

    /// Seed for noise injection and shuffling
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Use only the first N training images
    #[arg(long, global = true)]
    pub train_limit: Option<usize>,

    /// Use only the first N test images
    #[arg(long, global = true)]
    pub test_limit: Option<usize>,
}

impl HarnessArgs {
    /// Overlay the flags that were given onto `base`.
    pub fn apply(self, base: HarnessConfig) -> HarnessConfig {
        HarnessConfig {
            data_dir:      self.data_dir.unwrap_or(base.data_dir),
            model_dir:     self.model_dir.unwrap_or(base.model_dir),
            n_classes:     self.n_classes.unwrap_or(base.n_classes),
            epochs:        self.epochs.unwrap_or(base.epochs),
            batch_size:    self.batch_size.unwrap_or(base.batch_size),
            learning_rate: self.learning_rate.unwrap_or(base.learning_rate),
            patience: if self.no_early_stopping {
                None
            } else {
                self.patience.or(base.patience)
            },
            seed:          self.seed.unwrap_or(base.seed),
            train_limit:   self.train_limit.or(base.train_limit),
            test_limit:    self.test_limit.or(base.test_limit),
        }
    }
}

/// Convert CLI flags into the application-layer HarnessConfig.
/// The application layer never sees clap types.
impl From<HarnessArgs> for HarnessConfig {
    fn from(args: HarnessArgs) -> Self {
        args.apply(HarnessConfig::default())
    }
}

// ─── Ranges ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Explicit noise values, comma-separated
    #[arg(long, value_delimiter = ',', conflicts_with = "linspace")]
    pub values: Option<Vec<f64>>,

    /// Evenly spaced noise values: START,STOP,NUM
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub linspace: Option<Vec<f64>>,
}

impl RangeArgs {
    pub fn resolve(&self, default: (f64, f64, usize)) -> Result<Vec<f64>> {
        match (&self.values, &self.linspace) {
            (Some(values), _) => Ok(values.clone()),
            (None, Some(spec)) => match spec.as_slice() {
                &[start, stop, num] if num >= 1.0 && num.fract() == 0.0 => {
                    Ok(linspace(start, stop, num as usize))
                }
                _ => bail!("--linspace expects START,STOP,NUM with a whole NUM >= 1"),
            },
            (None, None) => {
                let (start, stop, num) = default;
                Ok(linspace(start, stop, num))
            }
        }
    }
}

/// Mesh ranges; any range left out takes its default
#[derive(Args, Debug, Clone, Default)]
pub struct MeshArgs {
    /// Label-noise fractions, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub fractions: Option<Vec<f64>>,

    /// Batch sizes, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub batch_sizes: Option<Vec<usize>>,

    /// Dropout scalars, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub dropouts: Option<Vec<f64>>,
}

impl MeshArgs {
    pub fn ranges(&self) -> Result<MeshRanges> {
        let defaults = MeshRanges::default();
        let fractions = self.fractions.clone().unwrap_or_else(|| defaults.fraction_values());
        let batch_sizes = self.batch_sizes.clone().unwrap_or_else(|| defaults.batch_sizes.clone());
        let dropouts = self.dropouts.clone().unwrap_or_else(|| defaults.dropout_values());
        Ok(MeshRanges::new(&fractions, &batch_sizes, &dropouts)?)
    }
}

// ─── Per-command arguments ────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ShowNoisyArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Show only the training image at this index
    #[arg(long)]
    pub index: Option<usize>,

    /// PNG to write; defaults to the system temp directory
    #[arg(long)]
    pub save_as: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SaveMeshArgs {
    /// JSON file to write the grid to
    pub file: PathBuf,

    #[command(flatten)]
    pub mesh: MeshArgs,
}

#[derive(Args, Debug)]
pub struct PlotMeshArgs {
    /// JSON grid written by save-acc-mesh
    pub file: PathBuf,

    /// PNG to write; defaults to the system temp directory
    #[arg(long)]
    pub save_as: Option<PathBuf>,

    #[command(flatten)]
    pub mesh: MeshArgs,
}

#[derive(Args, Debug)]
pub struct AxisArgs {
    /// Which data to corrupt: X (features) or y (labels)
    #[arg(long)]
    pub axis: NoiseAxis,

    #[command(flatten)]
    pub range: RangeArgs,
}

impl AxisArgs {
    pub fn default_range(&self) -> (f64, f64, usize) {
        match self.axis {
            NoiseAxis::Features => DEFAULT_STDDEVS,
            NoiseAxis::Labels   => DEFAULT_FRACTIONS,
        }
    }
}

#[derive(Args, Debug)]
pub struct ClasswiseArgs {
    // stddevs the feature-noise models were trained with
    #[command(flatten)]
    pub range: RangeArgs,

    /// JSON file to write the classwise table to
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// PNG to write; defaults to the system temp directory
    #[arg(long)]
    pub save_as: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RawAccArgs {
    #[command(flatten)]
    pub axis: AxisArgs,

    /// JSON file to write the accuracy series to
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// PNG to write; defaults to the system temp directory
    #[arg(long)]
    pub save_as: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let args = RangeArgs { values: Some(vec![0.0, 50.0, 100.0]), linspace: None };
        assert_eq!(args.resolve(DEFAULT_STDDEVS).unwrap(), vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_linspace_and_default_ranges() {
        let args = RangeArgs { values: None, linspace: Some(vec![0.0, 1.0, 5.0]) };
        assert_eq!(args.resolve(DEFAULT_STDDEVS).unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let default = RangeArgs::default().resolve(DEFAULT_STDDEVS).unwrap();
        assert_eq!(default.len(), 97);
        assert_eq!(default[96], 192.0);
    }

    #[test]
    fn test_malformed_linspace_is_rejected() {
        let args = RangeArgs { values: None, linspace: Some(vec![0.0, 1.0]) };
        assert!(args.resolve(DEFAULT_FRACTIONS).is_err());
        let args = RangeArgs { values: None, linspace: Some(vec![0.0, 1.0, 2.5]) };
        assert!(args.resolve(DEFAULT_FRACTIONS).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let base = HarnessConfig { epochs: 20, seed: 9, ..Default::default() };
        let args = HarnessArgs { epochs: Some(2), no_early_stopping: true, ..Default::default() };
        let cfg = args.apply(base);
        assert_eq!(cfg.epochs, 2);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.patience, None);
    }

    #[test]
    fn test_mesh_args_default_to_full_mesh() {
        let ranges = MeshArgs::default().ranges().unwrap();
        assert_eq!(ranges.shape(), [17, 8, 2]);

        let args = MeshArgs { batch_sizes: Some(vec![16]), ..Default::default() };
        assert_eq!(args.ranges().unwrap().shape(), [17, 1, 2]);
    }

    #[test]
    fn test_mesh_args_reject_bad_values() {
        let args = MeshArgs { fractions: Some(vec![1.5]), ..Default::default() };
        assert!(args.ranges().is_err());
    }
}
