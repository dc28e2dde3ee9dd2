use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};

use crate::domain::params::ModelParams;

/// Dropout after the convolution block, before scaling
pub const BASE_CONV_DROPOUT: f64 = 0.25;

/// Dropout before the output layer, before scaling
pub const BASE_DENSE_DROPOUT: f64 = 0.5;

const CONV1_CHANNELS: usize = 32;
const CONV2_CHANNELS: usize = 64;
const HIDDEN:         usize = 128;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
#[derive(Config, Debug)]
pub struct NoiseCnnConfig {
    pub n_classes:      usize,
    pub height:         usize,
    pub width:          usize,
    pub dropout_scalar: f64,
}

impl NoiseCnnConfig {
    pub fn from_params(params: &ModelParams) -> Self {
        Self::new(
            params.n_classes,
            params.image_height,
            params.image_width,
            params.dropout_scalar.value(),
        )
    }

    /// Flattened size after conv(3x3) → conv(3x3) → maxpool(2x2, stride 2)
    pub fn flat_features(&self) -> usize {
        let h = (self.height - 4) / 2;
        let w = (self.width  - 4) / 2;
        h * w * CONV2_CHANNELS
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> NoiseCnn<B> {
        NoiseCnn {
            conv1: Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3]).init(device),
            conv2: Conv2dConfig::new([CONV1_CHANNELS, CONV2_CHANNELS], [3, 3]).init(device),
            pool:  MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            conv_dropout:  DropoutConfig::new(BASE_CONV_DROPOUT * self.dropout_scalar).init(),
            fc1:   LinearConfig::new(self.flat_features(), HIDDEN).init(device),
            dense_dropout: DropoutConfig::new(BASE_DENSE_DROPOUT * self.dropout_scalar).init(),
            fc2:   LinearConfig::new(HIDDEN, self.n_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct NoiseCnn<B: Backend> {
    pub conv1:         Conv2d<B>,
    pub conv2:         Conv2d<B>,
    pub pool:          MaxPool2d,
    pub conv_dropout:  Dropout,
    pub fc1:           Linear<B>,
    pub dense_dropout: Dropout,
    pub fc2:           Linear<B>,
}

impl<B: Backend> NoiseCnn<B> {
    /// images: [batch, 1, height, width] → logits: [batch, n_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv1.forward(images));
        let x = relu(self.conv2.forward(x));
        let x = self.conv_dropout.forward(self.pool.forward(x));
        let x = x.flatten::<2>(1, 3);
        let x = self.dense_dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }

    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(images);
        let loss = burn::nn::loss::CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets);
        (loss, logits)
    }
}
