// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model-side burn code lives here; the application layer
// only sees the ModelTrainer and Predictor traits.
//
//   model.rs      — the small CNN whose dropout rates are
//                   scaled by the mesh's dropout scalar
//
//   trainer.rs    — the training loop: Adam, per-epoch
//                   validation, optional early stopping
//
//   inferencer.rs — reloaded model → predicted class indices
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Convolutional classifier architecture
pub mod model;

/// Training loop with validation and early stopping
pub mod trainer;

/// Batched class prediction from a reloaded model
pub mod inferencer;
