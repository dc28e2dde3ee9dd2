// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches:
//
//   IDX files
//       │
//       ▼
//   IdxLoader         → reads and formats the train/test split
//       │
//       ▼
//   NoiseInjector     → Gaussian feature noise or label noise
//       │
//       ▼
//   CategoricalLabels → class indices checked against n_classes
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher      → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads MNIST-style IDX files
pub mod loader;

/// Gaussian and label-noise corruption
pub mod noise;

/// Implements Burn's Dataset trait for image samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
