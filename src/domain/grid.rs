// ============================================================
// Layer 3 — Mesh Grids
// ============================================================
// A MeshGrid holds one scalar per mesh point: test accuracy for
// the accuracy grid, recorded epoch count for the convergence
// grid. Grids are only ever produced by GridBuilder::finish,
// which refuses to hand out a grid with unset cells.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;
use crate::domain::mesh::MeshRanges;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGrid {
    values: Array3<f64>,
}

/// Accuracy per (fraction, batch size, dropout scalar)
pub type AccuracyGrid = MeshGrid;

/// Epochs trained per (fraction, batch size, dropout scalar)
pub type ConvergenceGrid = MeshGrid;

impl MeshGrid {
    pub fn shape(&self) -> [usize; 3] {
        let s = self.values.shape();
        [s[0], s[1], s[2]]
    }

    pub fn get(&self, index: [usize; 3]) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn values(&self) -> &Array3<f64> {
        &self.values
    }

    /// Check the grid was built for these ranges. Reloaded grids
    /// are checked before plotting against the current ranges.
    pub fn check_shape(&self, ranges: &MeshRanges) -> Result<(), HarnessError> {
        let expected = ranges.shape();
        let actual   = self.shape();
        let names    = ["label fractions", "batch sizes", "dropout scalars"];
        for axis in 0..3 {
            if expected[axis] != actual[axis] {
                return Err(HarnessError::RangeMismatch {
                    what:     format!("grid axis for {}", names[axis]),
                    expected: expected[axis],
                    actual:   actual[axis],
                });
            }
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(HarnessError::IncompleteGrid {
                missing: self.values.iter().filter(|v| !v.is_finite()).count(),
                total:   self.values.len(),
            });
        }
        Ok(())
    }

    /// 2-D slice at one dropout index: rows = fractions, columns = batch sizes
    pub fn dropout_layer(&self, dropout_index: usize) -> Vec<Vec<f64>> {
        let [n_frac, n_batch, _] = self.shape();
        (0..n_frac)
            .map(|i| (0..n_batch).map(|j| self.values[[i, j, dropout_index]]).collect())
            .collect()
    }
}

/// Accumulates cell values in any order; `finish` fails if a cell is missing.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    cells: Array3<Option<f64>>,
}

impl GridBuilder {
    pub fn new(shape: [usize; 3]) -> Self {
        Self { cells: Array3::from_elem(shape, None) }
    }

    pub fn for_ranges(ranges: &MeshRanges) -> Self {
        Self::new(ranges.shape())
    }

    pub fn set(&mut self, index: [usize; 3], value: f64) -> Result<(), HarnessError> {
        if !value.is_finite() {
            return Err(HarnessError::InvalidConfig(format!(
                "grid cell {index:?} cannot hold non-finite value {value}"
            )));
        }
        let shape = self.cells.shape().to_vec();
        match self.cells.get_mut(index) {
            Some(cell) => {
                *cell = Some(value);
                Ok(())
            }
            None => Err(HarnessError::InvalidConfig(format!(
                "grid index {index:?} is outside shape {shape:?}"
            ))),
        }
    }

    pub fn missing(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn finish(self) -> Result<MeshGrid, HarnessError> {
        let missing = self.missing();
        if missing > 0 {
            return Err(HarnessError::IncompleteGrid { missing, total: self.cells.len() });
        }
        Ok(MeshGrid { values: self.cells.mapv(|c| c.unwrap_or(f64::NAN)) })
    }
}
