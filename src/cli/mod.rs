// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and routes each subcommand
// to its workflow in Layer 2. Nothing here trains, scores or
// plots; it only builds the configuration and prints summaries.
//
//   show-noisy-x        — example grid of noisy training images
//   save-acc-mesh       — train the mesh, save its accuracy grid
//   save-converge-mesh  — save the epochs grid of a trained mesh
//   plot-acc-mesh       — draw a saved accuracy grid
//   train-axis          — single-axis noise sweep
//   classwise           — per-class accuracy of feature-noise models
//   raw-acc             — overall accuracy along one axis
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{
    AxisArgs, ClasswiseArgs, Commands, HarnessArgs, PlotMeshArgs, RawAccArgs, SaveMeshArgs,
    ShowNoisyArgs, DEFAULT_STDDEVS,
};

use crate::application::config::HarnessConfig;
use crate::application::workflows;
use crate::domain::key::{AxisSweep, Stddev};

#[derive(Parser, Debug)]
#[command(
    name = "noise-sweep",
    version = "0.1.0",
    about = "Train classifiers under feature or label noise, then aggregate and plot their accuracy."
)]
pub struct Cli {
    #[command(flatten)]
    pub harness: HarnessArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let cfg = Self::config(self.harness)?;
        tracing::debug!("Harness configuration: {:?}", cfg);

        match self.command {
            Commands::ShowNoisyX(args)       => run_show_noisy(&cfg, args),
            Commands::SaveAccMesh(args)      => run_save_acc_mesh(&cfg, args),
            Commands::SaveConvergeMesh(args) => run_save_converge_mesh(&cfg, args),
            Commands::PlotAccMesh(args)      => run_plot_acc_mesh(&cfg, args),
            Commands::TrainAxis(args)        => run_train_axis(&cfg, args),
            Commands::Classwise(args)        => run_classwise(&cfg, args),
            Commands::RawAcc(args)           => run_raw_acc(&cfg, args),
        }
    }

    /// `--config` supplies the base; explicit flags override it.
    fn config(harness: HarnessArgs) -> Result<HarnessConfig> {
        match harness.config.clone() {
            Some(path) => {
                let base = HarnessConfig::load(&path)?;
                Ok(harness.apply(base))
            }
            None => Ok(harness.into()),
        }
    }
}

fn axis_sweep(args: &AxisArgs) -> Result<AxisSweep> {
    let values = args.range.resolve(args.default_range())?;
    Ok(AxisSweep::from_values(args.axis, &values)?)
}

fn run_show_noisy(cfg: &HarnessConfig, args: ShowNoisyArgs) -> Result<()> {
    let levels = args.range.resolve(DEFAULT_STDDEVS)?;
    let path = workflows::show_noisy_examples(cfg, &levels, args.index, args.save_as.as_deref())?;
    println!("Example grid written to {}", path.display());
    Ok(())
}

fn run_save_acc_mesh(cfg: &HarnessConfig, args: SaveMeshArgs) -> Result<()> {
    let ranges = args.mesh.ranges()?;
    let grid = workflows::save_accuracy_mesh(cfg, &ranges, &args.file)?;
    println!("Accuracy grid {:?} saved to {}", grid.shape(), args.file.display());
    Ok(())
}

fn run_save_converge_mesh(cfg: &HarnessConfig, args: SaveMeshArgs) -> Result<()> {
    let ranges = args.mesh.ranges()?;
    let grid = workflows::save_convergence_mesh(cfg, &ranges, &args.file)?;
    println!("Convergence grid {:?} saved to {}", grid.shape(), args.file.display());
    Ok(())
}

fn run_plot_acc_mesh(cfg: &HarnessConfig, args: PlotMeshArgs) -> Result<()> {
    let ranges = args.mesh.ranges()?;
    let path = workflows::plot_accuracy_mesh(cfg, &ranges, &args.file, args.save_as.as_deref())?;
    println!("Surface written to {}", path.display());
    Ok(())
}

fn run_train_axis(cfg: &HarnessConfig, args: AxisArgs) -> Result<()> {
    let sweep = axis_sweep(&args)?;
    let keys = workflows::train_axis(cfg, &sweep)?;
    println!("Trained {} models into {}", keys.len(), cfg.model_dir.display());
    Ok(())
}

fn run_classwise(cfg: &HarnessConfig, args: ClasswiseArgs) -> Result<()> {
    let stddevs = args
        .range
        .resolve(DEFAULT_STDDEVS)?
        .into_iter()
        .map(Stddev::new)
        .collect::<Result<Vec<_>, _>>()?;
    let table = workflows::classwise(cfg, &stddevs, args.out.as_deref(), args.save_as.as_deref())?;

    for (class, series) in &table.by_class {
        let last = series.last().copied().unwrap_or(f64::NAN);
        println!("class {class}: {:.4} at stddev {}", last, table.noise_levels.last().copied().unwrap_or(0.0));
    }
    Ok(())
}

fn run_raw_acc(cfg: &HarnessConfig, args: RawAccArgs) -> Result<()> {
    let sweep = axis_sweep(&args.axis)?;
    let accuracy = workflows::raw_accuracy(cfg, &sweep, args.out.as_deref(), args.save_as.as_deref())?;
    for (level, acc) in sweep.values().iter().zip(&accuracy) {
        println!("{level}\t{acc:.4}");
    }
    Ok(())
}
