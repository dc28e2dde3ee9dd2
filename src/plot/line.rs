// ============================================================
// Layer 7 — Accuracy Line Plots
// ============================================================
//   plot_classwise_accuracy          — one smoothed line per class
//                                      against feature-noise stddev
//   plot_raw_accuracy_vs_label_noise — overall accuracy against the
//                                      share of randomised labels,
//                                      with a dotted chance line

use anyhow::{bail, Result};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::{Path, PathBuf};

use crate::domain::classwise::ClasswiseAccuracy;
use crate::domain::error::HarnessError;
use crate::domain::params::chance_level;
use crate::plot::output::{announce, jet, ramp_positions, resolve_output};
use crate::plot::smoothing::{rolling_mean, SMOOTHING_WINDOW};

const SIZE: (u32, u32) = (1200, 800);

/// Axis bounds that stay valid for a single-point series
fn x_bounds(xs: &[f64]) -> (f64, f64) {
    let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

/// Classwise accuracy against the stddev of the feature noise.
pub fn plot_classwise_accuracy(table: &ClasswiseAccuracy, save_as: Option<&Path>) -> Result<PathBuf> {
    let levels = &table.noise_levels;
    for class in table.classes() {
        let len = table.series(class).map_or(0, <[f64]>::len);
        if len != levels.len() {
            bail!(HarnessError::RangeMismatch {
                what:     format!("accuracy series for class {class}"),
                expected: levels.len(),
                actual:   len,
            });
        }
    }

    let path = resolve_output(save_as, "classwise_accuracy")?;
    let (x_lo, x_hi) = x_bounds(levels);

    {
        let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Classwise accuracy vs. feature noise", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0f64..1.0f64)?;

        chart
            .configure_mesh()
            .x_desc("Standard Deviation of Gaussian Noise Added to Training Data")
            .y_desc("Accuracy")
            .draw()?;

        let classes: Vec<usize> = table.classes().collect();
        for (&class, t) in classes.iter().zip(ramp_positions(classes.len())) {
            let raw = table.series(class).unwrap_or_default();
            let smoothed = rolling_mean(raw, SMOOTHING_WINDOW);
            let color = jet(t);
            chart
                .draw_series(LineSeries::new(
                    levels.iter().copied().zip(smoothed),
                    color.stroke_width(2),
                ))?
                .label(class.to_string())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }
    announce(&path, save_as.is_some());
    Ok(path)
}

/// Overall test accuracy against the fraction of randomised training labels.
pub fn plot_raw_accuracy_vs_label_noise(
    fractions: &[f64],
    accuracy:  &[f64],
    n_classes: usize,
    save_as:   Option<&Path>,
) -> Result<PathBuf> {
    if fractions.len() != accuracy.len() {
        bail!(HarnessError::RangeMismatch {
            what:     "accuracy series".into(),
            expected: fractions.len(),
            actual:   accuracy.len(),
        });
    }

    let path = resolve_output(save_as, "raw_accuracy_vs_label_noise")?;
    let (x_lo, x_hi) = x_bounds(fractions);
    let chance = chance_level(n_classes);

    {
        let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Accuracy vs. label noise", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0f64..1.0f64)?;

        chart
            .configure_mesh()
            .x_desc("Percent of Training Labels Randomized")
            .y_desc("Accuracy")
            .x_label_formatter(&|x| format!("{:.1}%", x * 100.0))
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                fractions.iter().copied().zip(accuracy.iter().copied()),
                BLUE.stroke_width(2),
            ))?
            .label("Model Accuracy on Test Set")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

        chart
            .draw_series(DashedLineSeries::new(
                vec![(x_lo, chance), (x_hi, chance)],
                2,
                4,
                BLACK.into(),
            ))?
            .label("Naive Guessing")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));

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

    #[test]
    fn test_x_bounds_widen_single_points() {
        assert_eq!(x_bounds(&[2.0]), (1.5, 2.5));
        assert_eq!(x_bounds(&[0.0, 0.8, 0.4]), (0.0, 0.8));
        assert_eq!(x_bounds(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_mismatched_series_are_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.png");
        let err = plot_raw_accuracy_vs_label_noise(&[0.0, 0.1], &[0.9], 10, Some(&path)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::RangeMismatch { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_line_plots_are_written_where_asked() {
        let dir = tempfile::tempdir().unwrap();

        let raw_path = dir.path().join("raw.png");
        let written =
            plot_raw_accuracy_vs_label_noise(&[0.0, 0.4, 0.8], &[0.98, 0.7, 0.2], 10, Some(&raw_path)).unwrap();
        assert_eq!(written, raw_path);
        assert!(raw_path.exists());

        let mut table = ClasswiseAccuracy::new([0, 1]);
        table.noise_levels = vec![0.0, 50.0, 100.0, 150.0];
        table.by_class.insert(0, vec![1.0, 0.9, 0.6, 0.3]);
        table.by_class.insert(1, vec![1.0, 0.8, 0.5, 0.1]);
        let classwise_path = dir.path().join("classwise.png");
        let written = plot_classwise_accuracy(&table, Some(&classwise_path)).unwrap();
        assert_eq!(written, classwise_path);
        assert!(classwise_path.exists());
    }

    #[test]
    fn test_ragged_classwise_table_is_rejected() {
        let mut table = ClasswiseAccuracy::new([0, 1]);
        table.by_class.insert(0, vec![1.0]);
        table.noise_levels = vec![0.0, 10.0];
        assert!(plot_classwise_accuracy(&table, None).is_err());
    }
}
