// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the file system after training:
//
//   artifact_store.rs — model weights (burn CompactRecorder)
//                       plus params and history JSON side-cars,
//                       all named by ModelKey::storage_name().
//                       Implements ModelRepository.
//
//   results.rs        — JSON save/load for aggregated results
//                       (mesh grids, classwise tables, raw
//                       accuracy series)
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling with anyhow)

/// Per-model weights, params and history files
pub mod artifact_store;

/// Aggregated result files
pub mod results;
