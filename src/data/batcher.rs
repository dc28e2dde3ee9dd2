// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<ImageItem>
// into tensors for the CNN.
//
//   Input:  N ImageItems, each with height * width raw pixels
//   Output: ImageBatch { images: [N, 1, H, W], targets: [N] }
//
// Pixels arrive in 0–255 intensity units (possibly pushed
// outside that range by Gaussian noise) and are multiplied by
// PIXEL_SCALE here, so training and inference see the same
// input scaling.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageItem;

/// Multiplier taking raw 8-bit intensities to [0, 1]
pub const PIXEL_SCALE: f32 = 1.0 / 255.0;

#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Scaled images — shape: [batch_size, 1, height, width]
    pub images: Tensor<B, 4>,

    /// Class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
    height:     usize,
    width:      usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, height: usize, width: usize) -> Self {
        Self { device, height, width }
    }
}

/// Stack `count` raw images into a scaled [count, 1, height, width] tensor
pub fn images_to_tensor<B: Backend>(
    pixels: &[f32],
    count:  usize,
    height: usize,
    width:  usize,
    device: &B::Device,
) -> Tensor<B, 4> {
    let scaled: Vec<f32> = pixels.iter().map(|&p| p * PIXEL_SCALE).collect();
    Tensor::<B, 1>::from_floats(scaled.as_slice(), device)
        .reshape([count, 1, height, width])
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|item| item.label as i32)
            .collect();

        let images  = images_to_tensor::<B>(&pixels, batch_size, self.height, self.width, &self.device);
        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_scaling() {
        let device  = Default::default();
        let batcher = ImageBatcher::<NdArray>::new(device, 2, 3);
        let items = vec![
            ImageItem { pixels: vec![255.0; 6], label: 4 },
            ImageItem { pixels: vec![0.0; 6],   label: 1 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 1, 2, 3]);
        assert_eq!(batch.targets.dims(), [2]);

        let max: f32 = batch.images.max().into_scalar().elem();
        assert!((max - 1.0).abs() < 1e-6);
        let labels: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![4, 1]);
    }
}
