// ============================================================
// Layer 2 — Sweep Use Case
// ============================================================
// Trains one model per sweep point and leaves it on disk:
//
//   Step 1: Load the train/test split once     (Layer 4 - data)
//   Step 2: Corrupt the training set           (Layer 4 - data)
//             features → Gaussian noise, mean 0
//             labels   → round(fraction * n) relabelled
//   Step 3: Encode labels categorically        (Layer 3 - domain)
//   Step 4: Fit and persist under the key name (Layer 5/6 via trait)
//
// The mesh sweep draws label noise once per fraction and reuses
// it for every (batch size, dropout scalar) pair under that
// fraction, so those models differ only in their hyperparameters.
//
// The first failure aborts the sweep. Points already trained
// stay on disk; there is no resumption.

use anyhow::{bail, Context, Result};

use crate::data::noise::NoiseInjector;
use crate::domain::error::HarnessError;
use crate::domain::dataset::{CategoricalLabels, DataSplit, Features};
use crate::domain::key::{ensure_distinct, AxisSweep, ModelKey};
use crate::domain::mesh::MeshRanges;
use crate::domain::params::ModelParams;
use crate::domain::traits::{DatasetSource, ModelTrainer, TrainingData};

pub struct SweepUseCase<S: DatasetSource, T: ModelTrainer> {
    source:  S,
    trainer: T,
    base:    ModelParams,
}

impl<S: DatasetSource, T: ModelTrainer> SweepUseCase<S, T> {
    pub fn new(source: S, trainer: T, base: ModelParams) -> Self {
        Self { source, trainer, base }
    }

    /// Load the split and fix the image geometry of the base parameters.
    fn prepare(&self) -> Result<(DataSplit, ModelParams)> {
        let split = self.source.load()?;
        let params = ModelParams {
            image_height: split.train.features.height(),
            image_width:  split.train.features.width(),
            ..self.base.clone()
        };
        params.validate()?;
        Ok((split, params))
    }

    /// Train one model per value of a single-axis sweep. Returns the
    /// keys trained, in sweep order.
    pub fn train_axis(&self, sweep: &AxisSweep) -> Result<Vec<ModelKey>> {
        ensure_distinct("sweep values", &sweep.values())?;
        let (split, params) = self.prepare()?;
        let n_classes = params.n_classes;
        let test_y  = CategoricalLabels::encode(&split.test.labels, n_classes)?;
        let mut noise = NoiseInjector::new(params.seed);

        tracing::info!("Training {} models along the {} axis", sweep.len(), sweep.axis());

        let mut trained = Vec::with_capacity(sweep.len());
        for key in sweep.keys() {
            tracing::info!("Training with {}", key);

            let (train_x, train_y): (Features, Vec<u8>) = match key {
                ModelKey::Features { stddev } => (
                    noise.gaussian(&split.train.features, 0.0, stddev)?,
                    split.train.labels.clone(),
                ),
                ModelKey::Labels { fraction } => (
                    split.train.features.clone(),
                    noise.relabel(&split.train.labels, fraction, n_classes)?,
                ),
                ModelKey::Mesh { .. } => bail!(HarnessError::InvalidConfig(
                    "mesh points are trained with train_mesh".into(),
                )),
            };
            let train_y = CategoricalLabels::encode(&train_y, n_classes)?;

            let data = TrainingData {
                train_x: &train_x,
                train_y: &train_y,
                test_x:  &split.test.features,
                test_y:  &test_y,
            };
            self.trainer
                .fit_and_save(&key, &params, data)
                .with_context(|| format!("Training failed at {}", key))?;
            trained.push(key);
        }
        Ok(trained)
    }

    /// Train one model per point of the label-noise × batch size ×
    /// dropout mesh. Returns the keys trained, in grid order.
    pub fn train_mesh(&self, ranges: &MeshRanges) -> Result<Vec<ModelKey>> {
        ranges.validate()?;
        let (split, params) = self.prepare()?;
        let n_classes = params.n_classes;
        let test_y  = CategoricalLabels::encode(&split.test.labels, n_classes)?;
        let mut noise = NoiseInjector::new(params.seed);

        tracing::info!("Training {} models over a {:?} mesh", ranges.len(), ranges.shape());

        let mut trained = Vec::with_capacity(ranges.len());
        for (i, &fraction) in ranges.fractions.iter().enumerate() {
            let noisy   = noise.relabel(&split.train.labels, fraction, n_classes)?;
            let train_y = CategoricalLabels::encode(&noisy, n_classes)?;

            for point in ranges.points().filter(|p| p.index[0] == i) {
                let key = point.key();
                tracing::info!("Training with {}", key);

                let point_params = params.with_mesh_point(point.batch_size, point.dropout_scalar);
                let data = TrainingData {
                    train_x: &split.train.features,
                    train_y: &train_y,
                    test_x:  &split.test.features,
                    test_y:  &test_y,
                };
                self.trainer
                    .fit_and_save(&key, &point_params, data)
                    .with_context(|| format!("Training failed at {}", key))?;
                trained.push(key);
            }
        }
        Ok(trained)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    use crate::domain::dataset::LabeledImages;
    use crate::domain::history::TrainingHistory;
    use crate::domain::key::{DropoutScalar, NoiseAxis, Stddev};

    /// `n` 6x6 images whose pixels all equal their index; labels cycle
    /// through `n_classes`.
    pub(crate) fn synthetic_split(n: usize, n_classes: usize) -> DataSplit {
        let images = |n: usize| {
            let pixels = (0..n).flat_map(|i| std::iter::repeat(i as f32).take(36)).collect();
            Features::new(pixels, 6, 6).unwrap()
        };
        let labels = |n: usize| (0..n).map(|i| (i % n_classes) as u8).collect::<Vec<_>>();
        DataSplit {
            train: LabeledImages::new(images(n), labels(n)).unwrap(),
            test:  LabeledImages::new(images(n / 2), labels(n / 2)).unwrap(),
        }
    }

    pub(crate) struct FakeSource(pub DataSplit);

    impl DatasetSource for FakeSource {
        fn load(&self) -> Result<DataSplit> {
            Ok(self.0.clone())
        }
    }

    /// What the trainer was handed for one point
    struct Call {
        name:    String,
        params:  ModelParams,
        train_x: Features,
        train_y: Vec<usize>,
    }

    #[derive(Default)]
    struct FakeTrainer {
        calls:   RefCell<Vec<Call>>,
        fail_at: Option<usize>,
    }

    impl ModelTrainer for FakeTrainer {
        fn fit_and_save(&self, key: &ModelKey, params: &ModelParams, data: TrainingData<'_>) -> Result<TrainingHistory> {
            let mut calls = self.calls.borrow_mut();
            if self.fail_at == Some(calls.len()) {
                bail!("disk full");
            }
            calls.push(Call {
                name:    key.storage_name(),
                params:  params.clone(),
                train_x: data.train_x.clone(),
                train_y: data.train_y.indices().to_vec(),
            });
            Ok(TrainingHistory::default())
        }
    }

    fn base() -> ModelParams {
        ModelParams { n_classes: 3, ..Default::default() }
    }

    fn sweep_over(n: usize, trainer: FakeTrainer) -> SweepUseCase<FakeSource, FakeTrainer> {
        SweepUseCase::new(FakeSource(synthetic_split(n, 3)), trainer, base())
    }

    #[test]
    fn test_mesh_trains_every_point_under_a_unique_name() {
        let ranges = MeshRanges::new(&[0.0, 0.25, 0.5], &[8, 32], &[0.0, 1.0]).unwrap();
        let sweep = sweep_over(40, FakeTrainer::default());
        let keys = sweep.train_mesh(&ranges).unwrap();

        assert_eq!(keys.len(), 12);
        let calls = sweep.trainer.calls.borrow();
        let names: HashSet<&str> = calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(calls[0].name, "NoiseCnn_v.0.1_y_0.0_8_0.0");
        assert_eq!(calls[11].name, "NoiseCnn_v.0.1_y_0.5_32_1.0");
    }

    #[test]
    fn test_mesh_points_carry_their_hyperparameters() {
        let ranges = MeshRanges::new(&[0.1], &[8, 32], &[0.0, 1.0]).unwrap();
        let sweep = sweep_over(20, FakeTrainer::default());
        sweep.train_mesh(&ranges).unwrap();

        let calls = sweep.trainer.calls.borrow();
        let seen: Vec<(usize, DropoutScalar)> =
            calls.iter().map(|c| (c.params.batch_size, c.params.dropout_scalar)).collect();
        assert_eq!(seen, vec![
            (8, DropoutScalar::NONE), (8, DropoutScalar::BASE),
            (32, DropoutScalar::NONE), (32, DropoutScalar::BASE),
        ]);
        assert!(calls.iter().all(|c| c.params.image_height == 6 && c.params.image_width == 6));
    }

    #[test]
    fn test_mesh_reuses_label_noise_within_a_fraction() {
        let ranges = MeshRanges::new(&[0.0, 0.5], &[8, 16], &[1.0]).unwrap();
        let sweep = sweep_over(60, FakeTrainer::default());
        sweep.train_mesh(&ranges).unwrap();

        let calls = sweep.trainer.calls.borrow();
        let clean: Vec<usize> = (0..60).map(|i| i % 3).collect();
        assert_eq!(calls[0].train_y, clean);
        assert_eq!(calls[1].train_y, clean);
        assert_eq!(calls[2].train_y, calls[3].train_y);
        let changed = calls[2].train_y.iter().zip(&clean).filter(|(a, b)| a != b).count();
        assert!(changed > 0 && changed <= 30);
    }

    #[test]
    fn test_feature_axis_keeps_labels_and_zero_noise_keeps_pixels() {
        let sweep = sweep_over(12, FakeTrainer::default());
        let axis = AxisSweep::from_values(NoiseAxis::Features, &[0.0, 50.0]).unwrap();
        let keys = sweep.train_axis(&axis).unwrap();
        assert_eq!(keys.len(), 2);

        let calls = sweep.trainer.calls.borrow();
        let clean = synthetic_split(12, 3);
        assert_eq!(calls[0].name, "NoiseCnn_v.0.1_X_0.0");
        assert_eq!(calls[0].train_x, clean.train.features);
        assert_ne!(calls[1].train_x, clean.train.features);
        assert!(calls.iter().all(|c| c.train_y == (0..12).map(|i| i % 3).collect::<Vec<_>>()));
    }

    #[test]
    fn test_label_axis_names_and_encodes_every_point() {
        let sweep = sweep_over(12, FakeTrainer::default());
        let axis = AxisSweep::from_values(NoiseAxis::Labels, &[0.0, 1.0]).unwrap();
        sweep.train_axis(&axis).unwrap();

        let calls = sweep.trainer.calls.borrow();
        assert_eq!(calls[1].name, "NoiseCnn_v.0.1_y_1.0");
        assert!(calls[1].train_y.iter().all(|&c| c < 3));
    }

    #[test]
    fn test_first_failure_aborts_the_sweep() {
        let trainer = FakeTrainer { fail_at: Some(1), ..Default::default() };
        let sweep = sweep_over(12, trainer);
        let axis = AxisSweep::from_values(NoiseAxis::Labels, &[0.0, 0.1, 0.2]).unwrap();
        assert!(sweep.train_axis(&axis).is_err());
        assert_eq!(sweep.trainer.calls.borrow().len(), 1);
    }

    #[test]
    fn test_repeated_points_train_nothing() {
        let sweep = sweep_over(12, FakeTrainer::default());
        let stddev = Stddev::new(50.0).unwrap();
        let err = sweep.train_axis(&AxisSweep::Features(vec![stddev, stddev])).unwrap_err();
        assert!(matches!(err.downcast_ref::<HarnessError>(), Some(HarnessError::InvalidConfig(_))));
        assert!(sweep.trainer.calls.borrow().is_empty());
    }

    #[test]
    fn test_labels_outside_class_count_are_rejected() {
        let sweep = SweepUseCase::new(
            FakeSource(synthetic_split(12, 4)),
            FakeTrainer::default(),
            base(),
        );
        let axis = AxisSweep::from_values(NoiseAxis::Features, &[0.0]).unwrap();
        assert!(sweep.train_axis(&axis).is_err());
        assert!(sweep.trainer.calls.borrow().is_empty());
    }
}
