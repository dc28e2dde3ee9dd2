// ============================================================
// Layer 7 — Plot Output
// ============================================================
// Where a figure ends up, and the colour ramps shared by the
// plots. There is no windowing backend: a plot without an
// explicit destination is written to the system temp directory
// and its location is logged.

use anyhow::{Context, Result};
use plotters::style::RGBColor;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Resolve the PNG path for a figure, creating parent directories.
pub fn resolve_output(save_as: Option<&Path>, default_name: &str) -> Result<PathBuf> {
    let path = match save_as {
        Some(path) if path.extension().is_some() => path.to_path_buf(),
        Some(path) => path.with_extension("png"),
        None => std::env::temp_dir().join(format!("{default_name}.png")),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create plot directory '{}'", parent.display()))?;
    }
    Ok(path)
}

/// Log where a finished figure was written
pub fn announce(path: &Path, explicit: bool) {
    if explicit {
        tracing::info!("Saved plot to '{}'", path.display());
    } else {
        tracing::info!("No save path given; plot written to '{}'", path.display());
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Blue → cyan → yellow → red ramp for t in [0, 1]
pub fn jet(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    RGBColor(
        channel(1.5 - (4.0 * t - 3.0).abs()),
        channel(1.5 - (4.0 * t - 2.0).abs()),
        channel(1.5 - (4.0 * t - 1.0).abs()),
    )
}

/// Blue → green ramp for t in [0, 1]
pub fn winter(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    RGBColor(0, channel(t), channel(1.0 - t / 2.0))
}

/// Evenly spaced ramp positions for `n` series
pub fn ramp_positions(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..n).map(|i| i as f64 / (n - 1) as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_is_in_temp_dir() {
        let path = resolve_output(None, "surface").unwrap();
        assert_eq!(path, std::env::temp_dir().join("surface.png"));
    }

    #[test]
    fn test_explicit_output_gets_png_extension_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_output(Some(&dir.path().join("plots").join("acc")), "unused").unwrap();
        assert_eq!(path, dir.path().join("plots").join("acc.png"));
        assert!(dir.path().join("plots").is_dir());
    }

    #[test]
    fn test_jet_endpoints() {
        let RGBColor(r, g, b) = jet(0.0);
        assert_eq!((r, g, b), (0, 0, 128));
        let RGBColor(r, g, b) = jet(1.0);
        assert_eq!((r, g, b), (128, 0, 0));
        let RGBColor(_, g, _) = jet(0.5);
        assert_eq!(g, 255);
    }

    #[test]
    fn test_ramp_positions_span_unit_interval() {
        assert_eq!(ramp_positions(3), vec![0.0, 0.5, 1.0]);
        assert_eq!(ramp_positions(1), vec![0.0]);
    }
}
