// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers; no model math and no printing.
//
//   sweep_use_case     — trains one model per sweep point
//   aggregate_use_case — reloads models into accuracy and
//                        convergence arrays
//   workflows          — the end-to-end runs behind each CLI
//                        subcommand
//   config             — HarnessConfig shared by every workflow
//
// The use cases are generic over the Layer 3 traits, so their
// tests run against in-memory fakes.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Workflow configuration
pub mod config;

/// Single-axis and mesh training sweeps
pub mod sweep_use_case;

/// Accuracy and convergence aggregation
pub mod aggregate_use_case;

/// End-to-end runs behind the CLI
pub mod workflows;
