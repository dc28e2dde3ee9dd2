// ============================================================
// Layer 3 — Accuracy Calculations
// ============================================================
// Pure scoring of predicted class indices against the true
// labels of the held-out set, overall and per class, plus the
// ClasswiseAccuracy container that collects per-class scores
// across a feature-noise sweep.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;

/// Fraction of predictions equal to the true label.
/// An empty test set is an error rather than a NaN.
pub fn overall_accuracy(predicted: &[usize], truth: &[usize]) -> Result<f64, HarnessError> {
    check_lengths(predicted, truth)?;
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Top-1 accuracy restricted to each class present in `truth`.
pub fn per_class_accuracy(
    predicted: &[usize],
    truth:     &[usize],
) -> Result<BTreeMap<usize, f64>, HarnessError> {
    check_lengths(predicted, truth)?;
    // class → (correct, total)
    let mut counts: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    for (&p, &t) in predicted.iter().zip(truth) {
        let entry = counts.entry(t).or_insert((0, 0));
        entry.1 += 1;
        if p == t {
            entry.0 += 1;
        }
    }
    Ok(counts
        .into_iter()
        .map(|(class, (correct, total))| (class, correct as f64 / total as f64))
        .collect())
}

fn check_lengths(predicted: &[usize], truth: &[usize]) -> Result<(), HarnessError> {
    if truth.is_empty() {
        return Err(HarnessError::EmptyTestSet);
    }
    if predicted.len() != truth.len() {
        return Err(HarnessError::RangeMismatch {
            what:     "predictions".into(),
            expected: truth.len(),
            actual:   predicted.len(),
        });
    }
    Ok(())
}

// ─── ClasswiseAccuracy ────────────────────────────────────────────────────────
/// Class label → one accuracy per noise level, aligned with the
/// stddev range the models were trained on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClasswiseAccuracy {
    pub noise_levels: Vec<f64>,
    pub by_class:     BTreeMap<usize, Vec<f64>>,
}

impl ClasswiseAccuracy {
    /// Start an empty series for every class in `classes`.
    pub fn new(classes: impl IntoIterator<Item = usize>) -> Self {
        Self {
            noise_levels: Vec::new(),
            by_class:     classes.into_iter().map(|c| (c, Vec::new())).collect(),
        }
    }

    /// Append the per-class scores of the model trained at `noise_level`.
    /// The model must score exactly the classes this container tracks.
    pub fn push(&mut self, noise_level: f64, scores: &BTreeMap<usize, f64>) -> Result<(), HarnessError> {
        if scores.len() != self.by_class.len() || scores.keys().any(|c| !self.by_class.contains_key(c)) {
            return Err(HarnessError::RangeMismatch {
                what:     format!("classes scored at noise level {noise_level}"),
                expected: self.by_class.len(),
                actual:   scores.len(),
            });
        }
        for (class, acc) in scores {
            if let Some(series) = self.by_class.get_mut(class) {
                series.push(*acc);
            }
        }
        self.noise_levels.push(noise_level);
        Ok(())
    }

    pub fn classes(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_class.keys().copied()
    }

    pub fn series(&self, class: usize) -> Option<&[f64]> {
        self.by_class.get(&class).map(Vec::as_slice)
    }
}
