// ============================================================
// Layer 2 — Aggregate Use Case
// ============================================================
// Reloads trained models and turns them into the arrays the
// plots are drawn from:
//
//   classwise_accuracy → per-class accuracy per stddev
//   raw_accuracy       → overall accuracy per single-axis point
//   mesh_accuracy      → accuracy grid over the 3-D mesh
//   mesh_convergence   → epochs-trained grid over the 3-D mesh
//
// The test set comes from the same DatasetSource the sweep
// trained with, so its formatting matches. Any missing model or
// history fails the whole call; grids are only returned once
// every cell has been filled.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;

use crate::domain::classwise::{overall_accuracy, per_class_accuracy, ClasswiseAccuracy};
use crate::domain::dataset::{CategoricalLabels, Features};
use crate::domain::error::HarnessError;
use crate::domain::grid::{AccuracyGrid, ConvergenceGrid, GridBuilder};
use crate::domain::key::{ensure_distinct, AxisSweep, ModelKey, Stddev};
use crate::domain::mesh::MeshRanges;
use crate::domain::traits::{DatasetSource, ModelRepository};

/// Held-out images with their encoded labels
struct TestSet {
    x: Features,
    y: CategoricalLabels,
}

pub struct AggregateUseCase<S: DatasetSource, R: ModelRepository> {
    source:    S,
    repo:      R,
    n_classes: usize,
}

impl<S: DatasetSource, R: ModelRepository> AggregateUseCase<S, R> {
    pub fn new(source: S, repo: R, n_classes: usize) -> Self {
        Self { source, repo, n_classes }
    }

    fn test_set(&self) -> Result<TestSet> {
        let test = self.source.load()?.test;
        if test.is_empty() {
            bail!(HarnessError::EmptyTestSet);
        }
        let y = CategoricalLabels::encode(&test.labels, self.n_classes)?;
        Ok(TestSet { x: test.features, y })
    }

    fn predict(&self, key: &ModelKey, test: &TestSet) -> Result<Vec<usize>> {
        tracing::info!("Scoring model trained with {}", key);
        let predictor = self
            .repo
            .load_predictor(key)
            .with_context(|| format!("No usable model for {}", key))?;
        predictor.predict_classes(&test.x)
    }

    fn accuracy(&self, key: &ModelKey, test: &TestSet) -> Result<f64> {
        let predicted = self.predict(key, test)?;
        Ok(overall_accuracy(&predicted, test.y.indices())?)
    }

    /// Per-class accuracy of the feature-noise models, one entry per
    /// stddev. Label-noise models cannot be asked for.
    pub fn classwise_accuracy(&self, stddevs: &[Stddev]) -> Result<ClasswiseAccuracy> {
        ensure_distinct("stddevs", stddevs)?;
        let test = self.test_set()?;
        let classes = test.y.indices().iter().copied().collect::<BTreeSet<_>>();
        let mut table = ClasswiseAccuracy::new(classes);

        for &stddev in stddevs {
            let key = ModelKey::Features { stddev };
            let predicted = self.predict(&key, &test)?;
            let scores = per_class_accuracy(&predicted, test.y.indices())?;
            table.push(stddev.value(), &scores)?;
        }
        Ok(table)
    }

    /// Overall accuracy of every model in a single-axis sweep, in sweep order.
    pub fn raw_accuracy(&self, sweep: &AxisSweep) -> Result<Vec<f64>> {
        ensure_distinct("sweep values", &sweep.values())?;
        let test = self.test_set()?;
        sweep
            .keys()
            .iter()
            .map(|key| self.accuracy(key, &test))
            .collect()
    }

    /// Accuracy of every mesh model, at the index of its mesh point.
    pub fn mesh_accuracy(&self, ranges: &MeshRanges) -> Result<AccuracyGrid> {
        ranges.validate()?;
        let test = self.test_set()?;
        let mut grid = GridBuilder::for_ranges(ranges);
        for point in ranges.points() {
            let acc = self.accuracy(&point.key(), &test)?;
            grid.set(point.index, acc)?;
        }
        Ok(grid.finish()?)
    }

    /// Number of epochs each mesh model trained for, read from its history.
    pub fn mesh_convergence(&self, ranges: &MeshRanges) -> Result<ConvergenceGrid> {
        ranges.validate()?;
        let mut grid = GridBuilder::for_ranges(ranges);
        for point in ranges.points() {
            let key = point.key();
            let history = self
                .repo
                .load_history(&key)
                .with_context(|| format!("No usable history for {}", key))?;
            history.validate(&key.storage_name())?;
            tracing::debug!("{} trained for {} epochs", key, history.epochs());
            grid.set(point.index, history.epochs() as f64)?;
        }
        Ok(grid.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::application::sweep_use_case::tests::{synthetic_split, FakeSource};
    use crate::domain::history::TrainingHistory;
    use crate::domain::key::{LabelFraction, NoiseAxis};
    use crate::domain::traits::Predictor;

    /// Predicts the same class for every image
    struct ConstPredictor(usize);

    impl Predictor for ConstPredictor {
        fn predict_classes(&self, x: &Features) -> Result<Vec<usize>> {
            Ok(vec![self.0; x.len()])
        }
    }

    /// Storage name → (constant prediction, epochs trained)
    #[derive(Default)]
    struct FakeRepo {
        models: HashMap<String, (usize, usize)>,
    }

    impl FakeRepo {
        fn with(mut self, key: ModelKey, class: usize, epochs: usize) -> Self {
            self.models.insert(key.storage_name(), (class, epochs));
            self
        }
    }

    impl ModelRepository for FakeRepo {
        fn load_predictor(&self, key: &ModelKey) -> Result<Box<dyn Predictor>> {
            match self.models.get(&key.storage_name()) {
                Some(&(class, _)) => Ok(Box::new(ConstPredictor(class))),
                None => bail!("no model named '{}'", key.storage_name()),
            }
        }

        fn load_history(&self, key: &ModelKey) -> Result<TrainingHistory> {
            match self.models.get(&key.storage_name()) {
                Some(&(_, epochs)) => Ok(TrainingHistory {
                    acc:      vec![0.5; epochs],
                    loss:     vec![1.0; epochs],
                    val_acc:  vec![0.5; epochs],
                    val_loss: vec![1.0; epochs],
                }),
                None => bail!("no history named '{}'", key.storage_name()),
            }
        }
    }

    fn small_mesh() -> MeshRanges {
        MeshRanges::new(&[0.0, 0.2, 0.4], &[8, 16], &[0.0, 1.0]).unwrap()
    }

    fn mesh_repo(ranges: &MeshRanges) -> FakeRepo {
        ranges.points().fold(FakeRepo::default(), |repo, p| {
            let [i, j, k] = p.index;
            repo.with(p.key(), i, 1 + i + 2 * j + 4 * k)
        })
    }

    #[test]
    fn test_classwise_has_one_series_per_class_and_level() {
        let stddevs: Vec<Stddev> = [0.0, 50.0, 100.0].iter().map(|&s| Stddev::new(s).unwrap()).collect();
        let repo = stddevs.iter().enumerate().fold(FakeRepo::default(), |repo, (i, &stddev)| {
            repo.with(ModelKey::Features { stddev }, i, 3)
        });
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), repo, 10);

        let table = agg.classwise_accuracy(&stddevs).unwrap();
        assert_eq!(table.by_class.len(), 10);
        assert!(table.by_class.values().all(|series| series.len() == 3));
        assert_eq!(table.noise_levels, vec![0.0, 50.0, 100.0]);
        assert_eq!(table.series(0).unwrap(), &[1.0, 0.0, 0.0]);
        assert_eq!(table.series(2).unwrap(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_repeated_stddevs_are_rejected() {
        let stddev = Stddev::new(50.0).unwrap();
        let repo = FakeRepo::default().with(ModelKey::Features { stddev }, 0, 3);
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), repo, 10);

        let err = agg.classwise_accuracy(&[stddev, stddev]).unwrap_err();
        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::InvalidConfig(_))));
    }

    #[test]
    fn test_raw_accuracy_follows_sweep_order() {
        let sweep = AxisSweep::from_values(NoiseAxis::Labels, &[0.0, 0.5]).unwrap();
        let repo = FakeRepo::default()
            .with(ModelKey::Labels { fraction: LabelFraction::new(0.0).unwrap() }, 0, 1)
            .with(ModelKey::Labels { fraction: LabelFraction::new(0.5).unwrap() }, 7, 1);
        // 20 test images, labels cycling 0..4: class 0 is a fifth of them
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 5)), repo, 5);

        let acc = agg.raw_accuracy(&sweep).unwrap();
        assert_eq!(acc.len(), 2);
        assert!((acc[0] - 0.2).abs() < 1e-12);
        assert_eq!(acc[1], 0.0);
    }

    #[test]
    fn test_mesh_accuracy_fills_every_cell() {
        let ranges = small_mesh();
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), mesh_repo(&ranges), 10);

        let grid = agg.mesh_accuracy(&ranges).unwrap();
        assert_eq!(grid.shape(), [3, 2, 2]);
        assert!(grid.values().iter().all(|a| (0.0..=1.0).contains(a)));
        assert!(grid.check_shape(&ranges).is_ok());
    }

    #[test]
    fn test_mesh_convergence_reads_history_lengths() {
        let ranges = small_mesh();
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), mesh_repo(&ranges), 10);

        let grid = agg.mesh_convergence(&ranges).unwrap();
        assert_eq!(grid.get([0, 0, 0]), Some(1.0));
        assert_eq!(grid.get([2, 1, 1]), Some(9.0));
    }

    #[test]
    fn test_missing_history_fails_the_grid() {
        let ranges = small_mesh();
        let mut repo = mesh_repo(&ranges);
        let missing = ranges.points().nth(5).unwrap().key();
        repo.models.remove(&missing.storage_name());
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), repo, 10);

        assert!(agg.mesh_convergence(&ranges).is_err());
        assert!(agg.mesh_accuracy(&ranges).is_err());
    }

    #[test]
    fn test_empty_history_is_corrupt() {
        let ranges = MeshRanges::new(&[0.0], &[8], &[1.0]).unwrap();
        let key = ranges.points().next().unwrap().key();
        let repo = FakeRepo::default().with(key, 0, 0);
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(40, 10)), repo, 10);

        let err = agg.mesh_convergence(&ranges).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::CorruptHistory(_, _))
        ));
    }

    #[test]
    fn test_empty_test_set_is_an_error() {
        let sweep = AxisSweep::from_values(NoiseAxis::Features, &[0.0]).unwrap();
        let repo = FakeRepo::default().with(sweep.keys()[0], 0, 1);
        // one training image, zero test images
        let agg = AggregateUseCase::new(FakeSource(synthetic_split(1, 10)), repo, 10);

        let err = agg.raw_accuracy(&sweep).unwrap_err();
        assert_eq!(err.downcast_ref::<HarnessError>(), Some(&HarnessError::EmptyTestSet));
    }
}
