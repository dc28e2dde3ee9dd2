// ============================================================
// Layer 2 — Workflows
// ============================================================
// End-to-end runs behind the CLI subcommands. Each one wires
// the concrete collaborators (IDX loader, burn trainer, artifact
// store) into the use cases and hands the results to the result
// files and plots:
//
//   show_noisy_examples   → example grid image (or one-image strip)
//   save_accuracy_mesh    → train mesh, aggregate accuracy, save grid
//   save_convergence_mesh → aggregate epochs of a trained mesh, save grid
//   plot_accuracy_mesh    → load a saved grid, draw the surface
//   train_axis            → single-axis sweep
//   classwise             → classwise accuracy table + line plot
//   raw_accuracy          → raw accuracy series (+ plot for labels)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::application::aggregate_use_case::AggregateUseCase;
use crate::application::config::HarnessConfig;
use crate::application::sweep_use_case::SweepUseCase;
use crate::data::loader::IdxLoader;
use crate::data::noise::NoiseInjector;
use crate::domain::classwise::ClasswiseAccuracy;
use crate::domain::grid::{AccuracyGrid, ConvergenceGrid};
use crate::domain::key::{AxisSweep, ModelKey, Stddev};
use crate::domain::mesh::MeshRanges;
use crate::domain::traits::DatasetSource;
use crate::infra::artifact_store::ArtifactStore;
use crate::infra::results::{load_grid, save_json};
use crate::ml::trainer::BurnTrainer;
use crate::plot::{examples, line, surface};

fn loader(cfg: &HarnessConfig) -> IdxLoader {
    IdxLoader::new(&cfg.data_dir).with_limits(cfg.train_limit, cfg.test_limit)
}

fn sweep_use_case(cfg: &HarnessConfig) -> Result<SweepUseCase<IdxLoader, BurnTrainer>> {
    let store = ArtifactStore::new(&cfg.model_dir)?;
    Ok(SweepUseCase::new(loader(cfg), BurnTrainer::new(store), cfg.base_params()))
}

fn aggregate_use_case(cfg: &HarnessConfig) -> Result<AggregateUseCase<IdxLoader, ArtifactStore>> {
    let store = ArtifactStore::new(&cfg.model_dir)?;
    Ok(AggregateUseCase::new(loader(cfg), store, cfg.n_classes))
}

/// Draw the first training image of every class under increasing noise,
/// or only the training image at `index` when one is given.
pub fn show_noisy_examples(
    cfg:     &HarnessConfig,
    levels:  &[f64],
    index:   Option<usize>,
    save_as: Option<&Path>,
) -> Result<PathBuf> {
    let split = loader(cfg).load()?;
    let mut noise = NoiseInjector::new(cfg.seed);
    match index {
        Some(index) => examples::render_noisy_example(&split.train, index, levels, &mut noise, save_as),
        None => examples::render_noisy_examples(&split.train, levels, &mut noise, save_as),
    }
}

/// Train every mesh model, score them, and save the accuracy grid.
pub fn save_accuracy_mesh(cfg: &HarnessConfig, ranges: &MeshRanges, out: &Path) -> Result<AccuracyGrid> {
    sweep_use_case(cfg)?.train_mesh(ranges)?;
    let grid = aggregate_use_case(cfg)?.mesh_accuracy(ranges)?;
    save_json(out, &grid)?;
    Ok(grid)
}

/// Read the epoch count of every (already trained) mesh model and save the grid.
pub fn save_convergence_mesh(cfg: &HarnessConfig, ranges: &MeshRanges, out: &Path) -> Result<ConvergenceGrid> {
    let grid = aggregate_use_case(cfg)?.mesh_convergence(ranges)?;
    save_json(out, &grid)?;
    Ok(grid)
}

/// Plot a saved accuracy grid as a surface.
pub fn plot_accuracy_mesh(
    cfg:       &HarnessConfig,
    ranges:    &MeshRanges,
    grid_file: &Path,
    save_as:   Option<&Path>,
) -> Result<PathBuf> {
    let grid = load_grid(grid_file, ranges)?;
    surface::plot_accuracy_surface(&grid, ranges, cfg.n_classes, save_as)
}

pub fn train_axis(cfg: &HarnessConfig, sweep: &AxisSweep) -> Result<Vec<ModelKey>> {
    sweep_use_case(cfg)?.train_axis(sweep)
}

/// Classwise accuracy of the feature-noise models, optionally saved and plotted.
pub fn classwise(
    cfg:     &HarnessConfig,
    stddevs: &[Stddev],
    out:     Option<&Path>,
    save_as: Option<&Path>,
) -> Result<ClasswiseAccuracy> {
    let table = aggregate_use_case(cfg)?.classwise_accuracy(stddevs)?;
    if let Some(out) = out {
        save_json(out, &table)?;
    }
    line::plot_classwise_accuracy(&table, save_as)
        .context("Could not plot classwise accuracy")?;
    Ok(table)
}

/// Raw accuracy along one axis. Label-noise sweeps are also plotted
/// against the share of randomised labels.
pub fn raw_accuracy(
    cfg:     &HarnessConfig,
    sweep:   &AxisSweep,
    out:     Option<&Path>,
    save_as: Option<&Path>,
) -> Result<Vec<f64>> {
    let accuracy = aggregate_use_case(cfg)?.raw_accuracy(sweep)?;
    if let Some(out) = out {
        save_json(out, &accuracy)?;
    }
    match sweep {
        AxisSweep::Labels(_) => {
            line::plot_raw_accuracy_vs_label_noise(&sweep.values(), &accuracy, cfg.n_classes, save_as)
                .context("Could not plot raw accuracy")?;
        }
        AxisSweep::Features(_) => {
            tracing::info!("Raw accuracy is only plotted for label-noise sweeps");
        }
    }
    Ok(accuracy)
}
