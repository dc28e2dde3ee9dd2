// ============================================================
// Layer 7 — Noisy Example Grid
// ============================================================
// Rows of training images, EXAMPLE_COLUMNS columns of increasing
// Gaussian noise. The full grid shows the first training image
// of every class; the strip shows a single image by index. The
// columns sample the noise range at a stride derived from its
// length, so the first column is always the first noise level
// and (for 97 levels) the last column is the last one. Each
// column is labelled with its stddev underneath.
//
// Pixels are drawn dark-on-light: intensity 0 is white and 255
// (or more, after noise) is black.

use anyhow::{bail, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::data::noise::NoiseInjector;
use crate::domain::dataset::{Features, LabeledImages};
use crate::domain::error::HarnessError;
use crate::domain::key::Stddev;
use crate::plot::output::{announce, resolve_output};

pub const EXAMPLE_COLUMNS: usize = 13;

/// Screen pixels per image pixel
const CELL_SCALE: u32 = 4;

/// Gap between images, in screen pixels
const CELL_GAP: u32 = 2;

/// Height of the stddev labels under the last row
const LABEL_HEIGHT: u32 = 18;

/// Step between sampled noise levels so EXAMPLE_COLUMNS columns span the range.
pub fn example_stride(levels: usize) -> Result<usize, HarnessError> {
    if levels < EXAMPLE_COLUMNS {
        return Err(HarnessError::RangeMismatch {
            what:     "noise levels for the example grid".into(),
            expected: EXAMPLE_COLUMNS,
            actual:   levels,
        });
    }
    Ok((levels - 1) / (EXAMPLE_COLUMNS - 1))
}

/// The noise levels shown in the grid's columns, left to right
pub fn sampled_levels(levels: &[f64]) -> Result<Vec<f64>, HarnessError> {
    let stride = example_stride(levels.len())?;
    Ok(levels.iter().copied().step_by(stride).take(EXAMPLE_COLUMNS).collect())
}

/// Greyscale shade for a raw intensity, white at 0
fn shade(intensity: f32) -> RGBColor {
    let v = 255 - intensity.clamp(0.0, 255.0).round() as u8;
    RGBColor(v, v, v)
}

/// Column label: the stddev, without a trailing ".0"
fn level_label(level: f64) -> String {
    format!("{level}")
}

/// Render the class × noise-level example grid.
pub fn render_noisy_examples(
    train:   &LabeledImages,
    levels:  &[f64],
    noise:   &mut NoiseInjector,
    save_as: Option<&Path>,
) -> Result<PathBuf> {
    let classes: Vec<usize> = train.classes().into_iter().collect();
    if classes.is_empty() {
        bail!(HarnessError::InvalidConfig("no training images to show".into()));
    }
    let rows = classes
        .iter()
        .filter_map(|&c| train.first_of_class(c))
        .collect::<Vec<_>>();
    let examples = train.features.select(&rows)?;
    draw_grid(&examples, levels, noise, save_as, "noisy_examples")
}

/// Render one training image under every sampled noise level.
pub fn render_noisy_example(
    train:   &LabeledImages,
    index:   usize,
    levels:  &[f64],
    noise:   &mut NoiseInjector,
    save_as: Option<&Path>,
) -> Result<PathBuf> {
    if index >= train.len() {
        bail!(HarnessError::InvalidConfig(format!(
            "image index {index} is out of range for {} training images",
            train.len()
        )));
    }
    let example = train.features.select(&[index])?;
    draw_grid(&example, levels, noise, save_as, &format!("noisy_example_{index}"))
}

fn draw_grid(
    examples:     &Features,
    levels:       &[f64],
    noise:        &mut NoiseInjector,
    save_as:      Option<&Path>,
    default_name: &str,
) -> Result<PathBuf> {
    let columns = sampled_levels(levels)?;
    let rows = examples.len() as u32;

    let (h, w) = (examples.height() as u32, examples.width() as u32);
    let cell_w = w * CELL_SCALE + CELL_GAP;
    let cell_h = h * CELL_SCALE + CELL_GAP;
    let size = (cell_w * columns.len() as u32, cell_h * rows + LABEL_HEIGHT);

    let path = resolve_output(save_as, default_name)?;
    {
        let root = BitMapBackend::new(&path, size).into_drawing_area();
        root.fill(&WHITE)?;

        for (col, &level) in columns.iter().enumerate() {
            let noisy = noise.gaussian(examples, 0.0, Stddev::new(level)?)?;
            let x0 = (col as u32 * cell_w) as i32;
            for row in 0..rows {
                let Some(image) = noisy.image(row as usize) else { continue };
                let y0 = (row * cell_h) as i32;
                for (p, &intensity) in image.iter().enumerate() {
                    let px = x0 + (p as u32 % w * CELL_SCALE) as i32;
                    let py = y0 + (p as u32 / w * CELL_SCALE) as i32;
                    root.draw(&Rectangle::new(
                        [(px, py), (px + CELL_SCALE as i32, py + CELL_SCALE as i32)],
                        shade(intensity).filled(),
                    ))?;
                }
            }
            root.draw(&Text::new(
                level_label(level),
                (x0 + 2, (rows * cell_h) as i32 + 2),
                ("sans-serif", 12),
            ))?;
            tracing::debug!("Drew column {} (stddev {})", col, level);
        }

        root.present()?;
    }
    announce(&path, save_as.is_some());
    Ok(path)
}
