/// Window of the trailing moving average applied to classwise curves
pub const SMOOTHING_WINDOW: usize = 3;

/// Trailing moving average over `window` points. The first
/// `window - 1` points have no full window and keep their raw value,
/// so the output is always as long as the input.
pub fn rolling_mean(series: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return series.to_vec();
    }
    series
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            if i + 1 < window {
                raw
            } else {
                series[i + 1 - window..=i].iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}
