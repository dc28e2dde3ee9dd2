// ============================================================
// Layer 3 — Mesh Sweep Ranges
// ============================================================
// The 3-D sweep runs over label-noise fraction × batch size ×
// dropout scalar. `MeshRanges::points()` walks the Cartesian
// product in row-major order (fraction outermost, dropout
// innermost) and yields the grid index alongside each point,
// so the trainer and the aggregator enumerate identically.

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;
use crate::domain::key::{ensure_distinct, DropoutScalar, LabelFraction, ModelKey};

/// `num` evenly spaced values over [start, stop], both ends included.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            values[num - 1] = stop;
            values
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRanges {
    pub fractions:       Vec<LabelFraction>,
    pub batch_sizes:     Vec<usize>,
    pub dropout_scalars: Vec<DropoutScalar>,
}

/// One cell of the mesh with its position in the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshPoint {
    pub index:          [usize; 3],
    pub fraction:       LabelFraction,
    pub batch_size:     usize,
    pub dropout_scalar: DropoutScalar,
}

impl MeshPoint {
    pub fn key(&self) -> ModelKey {
        ModelKey::Mesh {
            fraction:       self.fraction,
            batch_size:     self.batch_size,
            dropout_scalar: self.dropout_scalar,
        }
    }
}

impl Default for MeshRanges {
    /// 17 fractions in [0, 0.8], batch sizes 2^3..=2^10, dropout off and on
    fn default() -> Self {
        Self {
            fractions: linspace(0.0, 0.8, 17)
                .into_iter()
                .filter_map(|f| LabelFraction::new(f).ok())
                .collect(),
            batch_sizes:     (3..11).map(|p| 1usize << p).collect(),
            dropout_scalars: vec![DropoutScalar::NONE, DropoutScalar::BASE],
        }
    }
}

impl MeshRanges {
    /// Build ranges from raw values, validating each one.
    pub fn new(
        fractions:       &[f64],
        batch_sizes:     &[usize],
        dropout_scalars: &[f64],
    ) -> Result<Self, HarnessError> {
        let ranges = Self {
            fractions: fractions
                .iter()
                .map(|&f| LabelFraction::new(f))
                .collect::<Result<_, _>>()?,
            batch_sizes: batch_sizes.to_vec(),
            dropout_scalars: dropout_scalars
                .iter()
                .map(|&s| DropoutScalar::new(s))
                .collect::<Result<_, _>>()?,
        };
        ranges.validate()?;
        Ok(ranges)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.fractions.is_empty() || self.batch_sizes.is_empty() || self.dropout_scalars.is_empty() {
            return Err(HarnessError::InvalidConfig(
                "every mesh range needs at least one value".into(),
            ));
        }
        if self.batch_sizes.contains(&0) {
            return Err(HarnessError::InvalidConfig("batch sizes must be positive".into()));
        }
        ensure_distinct("label-noise fractions", &self.fractions)?;
        ensure_distinct("batch sizes", &self.batch_sizes)?;
        ensure_distinct("dropout scalars", &self.dropout_scalars)?;
        Ok(())
    }

    /// Grid shape: (fractions, batch sizes, dropout scalars)
    pub fn shape(&self) -> [usize; 3] {
        [self.fractions.len(), self.batch_sizes.len(), self.dropout_scalars.len()]
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every point of the Cartesian product, in grid order.
    pub fn points(&self) -> impl Iterator<Item = MeshPoint> + '_ {
        self.fractions.iter().enumerate().flat_map(move |(i, &fraction)| {
            self.batch_sizes.iter().enumerate().flat_map(move |(j, &batch_size)| {
                self.dropout_scalars.iter().enumerate().map(move |(k, &dropout_scalar)| {
                    MeshPoint {
                        index: [i, j, k],
                        fraction,
                        batch_size,
                        dropout_scalar,
                    }
                })
            })
        })
    }

    pub fn fraction_values(&self) -> Vec<f64> {
        self.fractions.iter().map(|f| f.value()).collect()
    }

    pub fn dropout_values(&self) -> Vec<f64> {
        self.dropout_scalars.iter().map(|s| s.value()).collect()
    }

    /// log2 of each batch size, the surface plot's second axis
    pub fn log2_batch_sizes(&self) -> Vec<f64> {
        self.batch_sizes.iter().map(|&b| (b as f64).log2()).collect()
    }
}
