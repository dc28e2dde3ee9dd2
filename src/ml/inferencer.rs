// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Wraps a reloaded NoiseCnn on the inner backend and maps a
// Features block to predicted class indices. Images are pushed
// through in fixed-size chunks so the full test set never has
// to sit in one tensor.
use anyhow::{bail, Result};
use burn::backend::ndarray::NdArrayDevice;

use crate::data::batcher::images_to_tensor;
use crate::domain::dataset::Features;
use crate::domain::error::HarnessError;
use crate::domain::traits::Predictor;
use crate::ml::model::NoiseCnn;
use crate::ml::trainer::InnerBackend;

const PREDICT_CHUNK: usize = 512;

pub struct Inferencer {
    model:  NoiseCnn<InnerBackend>,
    device: NdArrayDevice,
    height: usize,
    width:  usize,
}

impl Inferencer {
    pub fn new(model: NoiseCnn<InnerBackend>, height: usize, width: usize) -> Self {
        Self { model, device: NdArrayDevice::default(), height, width }
    }
}

impl Predictor for Inferencer {
    fn predict_classes(&self, x: &Features) -> Result<Vec<usize>> {
        if x.height() != self.height || x.width() != self.width {
            bail!(HarnessError::InvalidConfig(format!(
                "model expects {}x{} images, got {}x{}",
                self.height, self.width, x.height(), x.width()
            )));
        }

        let mut predicted = Vec::with_capacity(x.len());
        for chunk in x.pixels().chunks(PREDICT_CHUNK * x.image_size()) {
            let count  = chunk.len() / x.image_size();
            let images = images_to_tensor::<InnerBackend>(
                chunk, count, self.height, self.width, &self.device,
            );
            let classes = self.model.forward(images).argmax(1).flatten::<1>(0, 1);
            predicted.extend(classes.into_data().iter::<i64>().map(|c| c as usize));
        }

        tracing::debug!("Predicted {} images", predicted.len());
        Ok(predicted)
    }
}
