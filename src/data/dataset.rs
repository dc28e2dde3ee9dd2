use burn::data::dataset::Dataset;

use crate::domain::dataset::{CategoricalLabels, Features};

/// One image and its class index, as handed to the batcher
#[derive(Debug, Clone)]
pub struct ImageItem {
    pub pixels: Vec<f32>,
    pub label:  usize,
}

/// Owned copy of an encoded split for burn's DataLoader
pub struct ImageDataset {
    features: Features,
    labels:   Vec<usize>,
}

impl ImageDataset {
    pub fn new(features: &Features, labels: &CategoricalLabels) -> Self {
        Self { features: features.clone(), labels: labels.indices().to_vec() }
    }

    pub fn height(&self) -> usize {
        self.features.height()
    }

    pub fn width(&self) -> usize {
        self.features.width()
    }
}

impl Dataset<ImageItem> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let pixels = self.features.image(index)?.to_vec();
        let label  = *self.labels.get(index)?;
        Some(ImageItem { pixels, label })
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}
