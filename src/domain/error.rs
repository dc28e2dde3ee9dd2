// ============================================================
// Layer 3 — Harness Errors
// ============================================================
// Typed failures raised by the domain layer. The outer layers
// wrap these in anyhow with extra context (file paths, grid
// points), so every variant carries only the values needed to
// describe what went wrong.
//
// Taxonomy:
//   - configuration errors  → InvalidConfig, UnknownAxis,
//                             RangeMismatch, InvalidNoise
//   - data errors           → LabelOutOfRange, CorruptHistory
//   - numeric errors        → EmptyTestSet
//   - grid validation       → IncompleteGrid

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarnessError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown noise axis tag '{0}' (expected 'X' or 'y')")]
    UnknownAxis(String),

    #[error("Range mismatch: {what} has {actual} entries, expected {expected}")]
    RangeMismatch {
        what:     String,
        expected: usize,
        actual:   usize,
    },

    #[error("Invalid noise value {value}: {reason}")]
    InvalidNoise { value: f64, reason: String },

    #[error("Label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("Training history for '{0}' is corrupt: {1}")]
    CorruptHistory(String, String),

    #[error("Cannot compute accuracy on an empty test set")]
    EmptyTestSet,

    #[error("Grid is incomplete: {missing} of {total} cells were never populated")]
    IncompleteGrid { missing: usize, total: usize },
}
