// ============================================================
// Layer 4 — Noise Injector
// ============================================================
// The two corruptions studied by the harness:
//
//   gaussian()  — x + N(mean, stddev) on every pixel
//   relabel()   — round(fraction * n) positions, chosen without
//                 replacement, get a label drawn uniformly from
//                 0..n_classes (which may equal the old label)
//
// The injector owns a seeded StdRng so a sweep is repeatable.
//
// Reference: rand / rand_distr crate documentation

use anyhow::{bail, Result};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::domain::dataset::Features;
use crate::domain::key::{LabelFraction, Stddev};

pub struct NoiseInjector {
    rng: StdRng,
}

impl NoiseInjector {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Add Gaussian noise with the given mean and stddev to every pixel
    pub fn gaussian(&mut self, x: &Features, mean: f64, stddev: Stddev) -> Result<Features> {
        if stddev.value() == 0.0 && mean == 0.0 {
            return Ok(x.clone());
        }
        let normal = Normal::new(mean as f32, stddev.value() as f32)?;
        let pixels = x
            .pixels()
            .iter()
            .map(|&p| p + normal.sample(&mut self.rng))
            .collect();
        Ok(x.with_pixels(pixels)?)
    }

    /// Positions that `relabel` would overwrite for `n` labels
    pub fn relabel_positions(&mut self, n: usize, fraction: LabelFraction) -> Vec<usize> {
        let amount = ((fraction.value() * n as f64).round() as usize).min(n);
        index::sample(&mut self.rng, n, amount).into_vec()
    }

    /// Randomly reassign a fraction of the labels
    pub fn relabel(&mut self, labels: &[u8], fraction: LabelFraction, n_classes: usize) -> Result<Vec<u8>> {
        if n_classes == 0 || n_classes > u8::MAX as usize + 1 {
            bail!("cannot draw u8 labels for {n_classes} classes");
        }
        let mut noisy = labels.to_vec();
        for i in self.relabel_positions(labels.len(), fraction) {
            noisy[i] = self.rng.gen_range(0..n_classes) as u8;
        }
        Ok(noisy)
    }
}
