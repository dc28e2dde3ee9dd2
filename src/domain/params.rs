// ============================================================
// Layer 3 — Model Parameter Set
// ============================================================
// Everything the model factory and the trainer need to build
// and fit one model. A ModelParams is created per sweep point,
// stored next to the trained weights, and read back when the
// model is reloaded for evaluation.

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;
use crate::domain::key::DropoutScalar;

/// Smallest image side the network accepts: two 3×3 valid
/// convolutions followed by a 2×2 pool must leave one pixel.
pub const MIN_IMAGE_SIDE: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub n_classes:      usize,
    pub epochs:         usize,
    pub batch_size:     usize,
    pub dropout_scalar: DropoutScalar,
    pub learning_rate:  f64,
    /// Stop after this many epochs without a validation-loss
    /// improvement. `None` always runs all epochs.
    pub patience:       Option<usize>,
    pub image_height:   usize,
    pub image_width:    usize,
    /// Seed for the data-loader shuffle
    pub seed:           u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_classes:      10,
            epochs:         12,
            batch_size:     128,
            dropout_scalar: DropoutScalar::BASE,
            learning_rate:  1e-3,
            patience:       Some(2),
            image_height:   28,
            image_width:    28,
            seed:           42,
        }
    }
}

impl ModelParams {
    /// Same parameters with a different batch size and dropout scalar,
    /// as used by the mesh sweep.
    pub fn with_mesh_point(&self, batch_size: usize, dropout_scalar: DropoutScalar) -> Self {
        Self { batch_size, dropout_scalar, ..self.clone() }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.n_classes < 2 {
            return Err(HarnessError::InvalidConfig(format!(
                "n_classes must be at least 2, got {}", self.n_classes
            )));
        }
        if self.epochs == 0 {
            return Err(HarnessError::InvalidConfig("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(HarnessError::InvalidConfig("batch_size must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(HarnessError::InvalidConfig(format!(
                "learning_rate must be positive, got {}", self.learning_rate
            )));
        }
        if self.image_height < MIN_IMAGE_SIDE || self.image_width < MIN_IMAGE_SIDE {
            return Err(HarnessError::InvalidConfig(format!(
                "images must be at least {MIN_IMAGE_SIDE}x{MIN_IMAGE_SIDE}, got {}x{}",
                self.image_height, self.image_width
            )));
        }
        Ok(())
    }

    /// Accuracy of a model that guesses uniformly at random
    pub fn chance_level(&self) -> f64 {
        chance_level(self.n_classes)
    }
}

/// 1 / number of classes
pub fn chance_level(n_classes: usize) -> f64 {
    1.0 / n_classes as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(ModelParams::default().validate().is_ok());
    }

    #[test]
    fn test_chance_level_is_one_over_classes() {
        assert_eq!(chance_level(10), 0.1);
        assert_eq!(chance_level(4), 0.25);
        assert_eq!(ModelParams::default().chance_level(), 0.1);
    }

    #[test]
    fn test_mesh_point_overrides_only_batch_and_dropout() {
        let base = ModelParams::default();
        let point = base.with_mesh_point(64, DropoutScalar::new(0.0).unwrap());
        assert_eq!(point.batch_size, 64);
        assert_eq!(point.dropout_scalar.value(), 0.0);
        assert_eq!(point.epochs, base.epochs);
        assert_eq!(point.n_classes, base.n_classes);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let p = ModelParams { batch_size: 0, ..ModelParams::default() };
        assert!(p.validate().is_err());
        let p = ModelParams { image_height: 4, ..ModelParams::default() };
        assert!(p.validate().is_err());
        let p = ModelParams { n_classes: 1, ..ModelParams::default() };
        assert!(p.validate().is_err());
    }
}
