// ============================================================
// Layer 7 — Plotting (plotters)
// ============================================================
// PNG figures from aggregated results. Nothing here trains or
// loads models; every function takes the arrays produced by the
// aggregate use case (or loaded from a result file).
//
//   line.rs      — classwise and raw accuracy line plots
//   surface.rs   — 3-D accuracy wireframe with chance plane
//   examples.rs  — class × noise-level grid of training images
//   smoothing.rs — trailing moving average for line plots
//   output.rs    — output paths and colour ramps
//
// Chance level is always 1 / n_classes.

pub mod examples;
pub mod line;
pub mod output;
pub mod smoothing;
pub mod surface;
