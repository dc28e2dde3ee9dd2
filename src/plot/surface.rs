// ============================================================
// Layer 7 — Accuracy Surface
// ============================================================
// 3-D wireframe of test accuracy over (label-noise fraction,
// log2 batch size), one wireframe per dropout scalar, with a
// flat wireframe at chance level for reference.
//
// Plotters' 3-D coordinates put the second axis vertical, so
// points are (fraction, accuracy, log2 batch size).

use anyhow::Result;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

use crate::domain::grid::AccuracyGrid;
use crate::domain::mesh::MeshRanges;
use crate::domain::params::chance_level;
use crate::plot::output::{announce, ramp_positions, resolve_output, winter};

const SIZE: (u32, u32) = (1200, 1000);

/// Min/max of a non-empty axis, padded when it holds a single value
fn axis_range(values: &[f64]) -> std::ops::Range<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi > lo { lo..hi } else { (lo - 0.5)..(hi + 0.5) }
}

/// Legend text for one dropout layer
fn dropout_label(scalar: f64) -> String {
    if scalar == 0.0 {
        "No Dropout".to_string()
    } else {
        format!("Dropout x{scalar}")
    }
}

/// Wireframe lines of one z-surface: rows along the first axis, then
/// columns along the second. `z[i][j]` sits at `(xs[i], ys[j])`.
pub fn wireframe_lines(xs: &[f64], ys: &[f64], z: &[Vec<f64>]) -> Vec<Vec<(f64, f64, f64)>> {
    let mut lines = Vec::with_capacity(xs.len() + ys.len());
    for (i, &x) in xs.iter().enumerate() {
        lines.push(ys.iter().enumerate().map(|(j, &y)| (x, z[i][j], y)).collect());
    }
    for (j, &y) in ys.iter().enumerate() {
        lines.push(xs.iter().enumerate().map(|(i, &x)| (x, z[i][j], y)).collect());
    }
    lines
}

/// Accuracy surface for every dropout scalar of the mesh.
pub fn plot_accuracy_surface(
    grid:      &AccuracyGrid,
    ranges:    &MeshRanges,
    n_classes: usize,
    save_as:   Option<&Path>,
) -> Result<PathBuf> {
    grid.check_shape(ranges)?;

    let fractions = ranges.fraction_values();
    let log2_batches = ranges.log2_batch_sizes();
    let dropouts = ranges.dropout_values();
    let chance = chance_level(n_classes);

    let path = resolve_output(save_as, "accuracy_surface")?;
    {
        let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Accuracy vs. label noise (x) and log2(batch size) (z)",
                ("sans-serif", 24),
            )
            .margin(20)
            .build_cartesian_3d(axis_range(&fractions), 0.0f64..1.0f64, axis_range(&log2_batches))?;

        chart.with_projection(|mut pb| {
            pb.yaw   = 0.6;
            pb.pitch = 0.35;
            pb.scale = 0.85;
            pb.into_matrix()
        });

        chart
            .configure_axes()
            .light_grid_style(BLACK.mix(0.1))
            .max_light_lines(3)
            .draw()?;

        for ((k, &scalar), t) in dropouts.iter().enumerate().zip(ramp_positions(dropouts.len())) {
            let color = winter(t);
            let layer = grid.dropout_layer(k);
            let mut lines = wireframe_lines(&fractions, &log2_batches, &layer).into_iter();
            if let Some(first) = lines.next() {
                chart
                    .draw_series(LineSeries::new(first, &color))?
                    .label(dropout_label(scalar))
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
            for line in lines {
                chart.draw_series(LineSeries::new(line, &color))?;
            }
        }

        let flat = vec![vec![chance; log2_batches.len()]; fractions.len()];
        let mut lines = wireframe_lines(&fractions, &log2_batches, &flat).into_iter();
        if let Some(first) = lines.next() {
            chart
                .draw_series(LineSeries::new(first, &BLACK))?
                .label("Naive Model")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));
        }
        for line in lines {
            chart.draw_series(LineSeries::new(line, &BLACK))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }
    announce(&path, save_as.is_some());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::GridBuilder;

    #[test]
    fn test_wireframe_covers_rows_and_columns() {
        let z = vec![vec![0.9, 0.8], vec![0.5, 0.4], vec![0.1, 0.2]];
        let lines = wireframe_lines(&[0.0, 0.4, 0.8], &[3.0, 4.0], &z);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], vec![(0.0, 0.9, 3.0), (0.0, 0.8, 4.0)]);
        assert_eq!(lines[4], vec![(0.0, 0.8, 4.0), (0.4, 0.4, 4.0), (0.8, 0.2, 4.0)]);
    }

    #[test]
    fn test_chance_plane_height() {
        let flat = vec![vec![chance_level(10); 2]; 2];
        let lines = wireframe_lines(&[0.0, 0.5], &[3.0, 10.0], &flat);
        assert!(lines.iter().flatten().all(|&(_, y, _)| y == 0.1));
    }

    #[test]
    fn test_axis_range_pads_single_values() {
        assert_eq!(axis_range(&[3.0]), 2.5..3.5);
        assert_eq!(axis_range(&[3.0, 10.0, 5.0]), 3.0..10.0);
    }

    #[test]
    fn test_dropout_labels() {
        assert_eq!(dropout_label(0.0), "No Dropout");
        assert_eq!(dropout_label(1.0), "Dropout x1");
    }

    #[test]
    fn test_surface_is_written_where_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots").join("surface.png");
        let ranges = MeshRanges::new(&[0.0, 0.4, 0.8], &[8, 16], &[0.0, 1.0]).unwrap();
        let mut builder = GridBuilder::for_ranges(&ranges);
        for point in ranges.points() {
            builder.set(point.index, 1.0 - point.fraction.value()).unwrap();
        }
        let grid = builder.finish().unwrap();

        let written = plot_accuracy_surface(&grid, &ranges, 10, Some(&path)).unwrap();
        assert_eq!(written, path);
        assert!(path.exists());
    }

    #[test]
    fn test_grid_for_other_mesh_is_not_plotted() {
        let ranges = MeshRanges::new(&[0.0, 0.1], &[8], &[1.0]).unwrap();
        let mut builder = GridBuilder::new([1, 1, 1]);
        builder.set([0, 0, 0], 0.5).unwrap();
        let grid = builder.finish().unwrap();
        assert!(plot_accuracy_surface(&grid, &ranges, 10, None).is_err());
    }
}
