// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the sweep:
// what identifies a model, which parameters it was trained
// with, how results are laid out, and which collaborators the
// application layer talks to.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Typed harness errors
pub mod error;

/// ModelKey, noise axes and characteristic noise values
pub mod key;

/// Per-model hyperparameters
pub mod params;

/// Mesh sweep ranges and their Cartesian product
pub mod mesh;

/// Fully populated 3-D result grids
pub mod grid;

/// Per-epoch training metrics
pub mod history;

/// Overall and per-class accuracy
pub mod classwise;

/// Image features, labels and categorical targets
pub mod dataset;

/// Collaborator traits implemented by the outer layers
pub mod traits;
