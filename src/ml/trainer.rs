// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits one NoiseCnn with Adam, evaluating on the held-out set
// after every epoch, and stops early once validation loss has
// not improved for `patience` epochs. The recorded history's
// length is what the convergence grid reports.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on InnerBackend (NdArray),
//     with dropout disabled
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    backend::ndarray::NdArrayDevice,
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::data::{batcher::ImageBatcher, dataset::ImageDataset};
use crate::domain::error::HarnessError;
use crate::domain::history::{EpochMetrics, TrainingHistory};
use crate::domain::key::ModelKey;
use crate::domain::params::ModelParams;
use crate::domain::traits::{ModelTrainer, TrainingData};
use crate::infra::artifact_store::ArtifactStore;
use crate::ml::model::{NoiseCnn, NoiseCnnConfig};

pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
pub type InnerBackend = burn::backend::NdArray;

/// Batch size used for the per-epoch validation pass
const VALID_BATCH_SIZE: usize = 512;

/// Fits models with burn and writes them to an ArtifactStore.
pub struct BurnTrainer {
    store: ArtifactStore,
}

impl BurnTrainer {
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }
}

impl ModelTrainer for BurnTrainer {
    fn fit_and_save(
        &self,
        key:    &ModelKey,
        params: &ModelParams,
        data:   TrainingData<'_>,
    ) -> Result<TrainingHistory> {
        let name = key.storage_name();
        tracing::info!("Fitting '{}' (batch size {}, dropout scalar {})",
            name, params.batch_size, params.dropout_scalar.value());

        let (model, history) = run_training(params, &data)?;

        self.store.save_params(key, params)?;
        self.store.save_model(key, &model)?;
        self.store.save_history(key, &history)?;
        tracing::info!("Saved '{}' after {} epochs", name, history.epochs());
        Ok(history)
    }
}

/// Check the encoded data agrees with the parameters before fitting
fn check_inputs(params: &ModelParams, data: &TrainingData<'_>) -> Result<()> {
    params.validate()?;
    if data.train_x.is_empty() {
        bail!(HarnessError::InvalidConfig("training set is empty".into()));
    }
    if data.test_x.is_empty() {
        bail!(HarnessError::EmptyTestSet);
    }
    for (x, what) in [(data.train_x, "training"), (data.test_x, "test")] {
        if x.height() != params.image_height || x.width() != params.image_width {
            bail!(HarnessError::InvalidConfig(format!(
                "{what} images are {}x{}, parameters expect {}x{}",
                x.height(), x.width(), params.image_height, params.image_width
            )));
        }
    }
    for y in [data.train_y, data.test_y] {
        if y.n_classes() != params.n_classes {
            bail!(HarnessError::InvalidConfig(format!(
                "labels were encoded for {} classes, parameters expect {}",
                y.n_classes(), params.n_classes
            )));
        }
    }
    Ok(())
}

/// Train a fresh model and return it (on the inner backend) with its history.
pub fn run_training(
    params: &ModelParams,
    data:   &TrainingData<'_>,
) -> Result<(NoiseCnn<InnerBackend>, TrainingHistory)> {
    check_inputs(params, data)?;

    let device = NdArrayDevice::default();
    TrainBackend::seed(params.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: NoiseCnn<TrainBackend> = NoiseCnnConfig::from_params(params).init(&device);
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    let (h, w) = (params.image_height, params.image_width);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<TrainBackend>::new(device.clone(), h, w))
        .batch_size(params.batch_size)
        .shuffle(params.seed)
        .num_workers(1)
        .build(ImageDataset::new(data.train_x, data.train_y));

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let valid_loader = DataLoaderBuilder::new(ImageBatcher::<InnerBackend>::new(device.clone(), h, w))
        .batch_size(VALID_BATCH_SIZE)
        .num_workers(1)
        .build(ImageDataset::new(data.test_x, data.test_y));

    let mut history       = TrainingHistory::default();
    let mut best_val_loss = f64::INFINITY;
    let mut stale_epochs  = 0usize;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=params.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let (loss, logits) = model.forward_loss(batch.images, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches  += 1;
            seen     += batch.targets.dims()[0];
            correct  += count_correct(logits, batch.targets);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(params.learning_rate, model, grads);
        }

        // dropout disabled for evaluation
        let model_valid = model.valid();

        let mut val_loss_sum = 0.0f64;
        let mut val_batches  = 0usize;
        let mut val_correct  = 0usize;
        let mut val_seen     = 0usize;

        for batch in valid_loader.iter() {
            let logits = model_valid.forward(batch.images);
            let ce = burn::nn::loss::CrossEntropyLossConfig::new().init(&logits.device());
            val_loss_sum += ce
                .forward(logits.clone(), batch.targets.clone())
                .into_scalar()
                .elem::<f64>();
            val_batches += 1;
            val_seen    += batch.targets.dims()[0];
            val_correct += count_correct(logits, batch.targets);
        }

        let metrics = EpochMetrics {
            epoch,
            train_loss: loss_sum / batches.max(1) as f64,
            train_acc:  correct as f64 / seen.max(1) as f64,
            val_loss:   val_loss_sum / val_batches.max(1) as f64,
            val_acc:    val_correct as f64 / val_seen.max(1) as f64,
        };
        history.record(&metrics);

        println!(
            "Epoch {:>3}/{} | loss={:.4} | acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, params.epochs, metrics.train_loss, metrics.train_acc * 100.0,
            metrics.val_loss, metrics.val_acc * 100.0,
        );

        if metrics.is_improvement(best_val_loss) {
            best_val_loss = metrics.val_loss;
            stale_epochs  = 0;
        } else {
            stale_epochs += 1;
            if params.patience.is_some_and(|p| stale_epochs >= p) {
                tracing::info!("Early stopping after epoch {} (no val_loss improvement for {} epochs)",
                    epoch, stale_epochs);
                break;
            }
        }
    }

    Ok((model.valid(), history))
}

fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}
