// ============================================================
// Layer 3 — Image Dataset Types
// ============================================================
// Plain containers for a formatted image classification split.
// Pixels are kept in raw intensity units (0–255 for MNIST) so
// Gaussian noise stddevs are expressed in the same units; the
// batcher rescales when it builds tensors.
//
// Layout: images are stored back to back, row-major, one
// `height * width` block per image.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;

/// A block of equally sized grayscale images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pixels: Vec<f32>,
    height: usize,
    width:  usize,
}

impl Features {
    pub fn new(pixels: Vec<f32>, height: usize, width: usize) -> Result<Self, HarnessError> {
        let side = height.checked_mul(width).unwrap_or(0);
        if side == 0 || pixels.len() % side != 0 {
            return Err(HarnessError::InvalidConfig(format!(
                "{} pixels do not split into {height}x{width} images",
                pixels.len()
            )));
        }
        Ok(Self { pixels, height, width })
    }

    pub fn len(&self) -> usize {
        self.pixels.len() / self.image_size()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn image_size(&self) -> usize {
        self.height * self.width
    }

    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Pixels of image `index`, or None when out of range
    pub fn image(&self, index: usize) -> Option<&[f32]> {
        let size = self.image_size();
        self.pixels.get(index * size..(index + 1) * size)
    }

    /// Same geometry, new pixels. Used by the noise injector.
    pub fn with_pixels(&self, pixels: Vec<f32>) -> Result<Self, HarnessError> {
        if pixels.len() != self.pixels.len() {
            return Err(HarnessError::RangeMismatch {
                what:     "pixel buffer".into(),
                expected: self.pixels.len(),
                actual:   pixels.len(),
            });
        }
        Ok(Self { pixels, height: self.height, width: self.width })
    }

    /// The images at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Result<Self, HarnessError> {
        let mut pixels = Vec::with_capacity(indices.len() * self.image_size());
        for &i in indices {
            let image = self.image(i).ok_or_else(|| {
                HarnessError::InvalidConfig(format!("image index {i} out of range ({})", self.len()))
            })?;
            pixels.extend_from_slice(image);
        }
        Ok(Self { pixels, height: self.height, width: self.width })
    }
}

/// Images plus their integer class labels, before categorical encoding
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledImages {
    pub features: Features,
    pub labels:   Vec<u8>,
}

impl LabeledImages {
    pub fn new(features: Features, labels: Vec<u8>) -> Result<Self, HarnessError> {
        if features.len() != labels.len() {
            return Err(HarnessError::RangeMismatch {
                what:     "labels".into(),
                expected: features.len(),
                actual:   labels.len(),
            });
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct labels present, sorted
    pub fn classes(&self) -> BTreeSet<usize> {
        self.labels.iter().map(|&l| l as usize).collect()
    }

    /// Index of the first example of `class`
    pub fn first_of_class(&self, class: usize) -> Option<usize> {
        self.labels.iter().position(|&l| l as usize == class)
    }

    /// Keep only the first `limit` examples
    pub fn truncate(&mut self, limit: usize) {
        if limit < self.len() {
            let size = self.features.image_size();
            self.features.pixels.truncate(limit * size);
            self.labels.truncate(limit);
        }
    }
}

/// Formatted train/test split
#[derive(Debug, Clone, PartialEq)]
pub struct DataSplit {
    pub train: LabeledImages,
    pub test:  LabeledImages,
}

// ─── CategoricalLabels ────────────────────────────────────────────────────────
/// Labels checked against a fixed class count. The trainer only
/// accepts targets in this form, whichever axis was corrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalLabels {
    classes:   Vec<usize>,
    n_classes: usize,
}

impl CategoricalLabels {
    pub fn encode(labels: &[u8], n_classes: usize) -> Result<Self, HarnessError> {
        let classes = labels
            .iter()
            .map(|&l| {
                let label = l as usize;
                if label < n_classes {
                    Ok(label)
                } else {
                    Err(HarnessError::LabelOutOfRange { label, n_classes })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { classes, n_classes })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class index of every example
    pub fn indices(&self) -> &[usize] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> LabeledImages {
        // three 2x2 images with labels 1, 0, 1
        let features = Features::new((0..12).map(|v| v as f32).collect(), 2, 2).unwrap();
        LabeledImages::new(features, vec![1, 0, 1]).unwrap()
    }

    #[test]
    fn test_features_geometry() {
        let data = tiny();
        assert_eq!(data.features.len(), 3);
        assert_eq!(data.features.image(1), Some(&[4.0, 5.0, 6.0, 7.0][..]));
        assert_eq!(data.features.image(3), None);
        assert!(Features::new(vec![0.0; 5], 2, 2).is_err());
        assert!(Features::new(vec![0.0; 4], usize::MAX, 2).is_err());
    }

    #[test]
    fn test_label_count_must_match() {
        let features = Features::new(vec![0.0; 8], 2, 2).unwrap();
        assert!(LabeledImages::new(features, vec![0]).is_err());
    }

    #[test]
    fn test_classes_and_first_of_class() {
        let data = tiny();
        assert_eq!(data.classes().into_iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(data.first_of_class(1), Some(0));
        assert_eq!(data.first_of_class(0), Some(1));
        assert_eq!(data.first_of_class(7), None);
    }

    #[test]
    fn test_select_and_truncate() {
        let mut data = tiny();
        let picked = data.features.select(&[2, 0]).unwrap();
        assert_eq!(picked.image(0), Some(&[8.0, 9.0, 10.0, 11.0][..]));
        assert!(data.features.select(&[5]).is_err());

        data.truncate(2);
        assert_eq!(data.len(), 2);
        assert_eq!(data.features.len(), 2);
    }

    #[test]
    fn test_categorical_encoding() {
        let y = CategoricalLabels::encode(&[2, 0], 3).unwrap();
        assert_eq!(y.indices(), &[2, 0]);
        assert_eq!(y.n_classes(), 3);
    }

    #[test]
    fn test_categorical_rejects_out_of_range_labels() {
        let err = CategoricalLabels::encode(&[0, 10], 10).unwrap_err();
        assert_eq!(err, HarnessError::LabelOutOfRange { label: 10, n_classes: 10 });
    }
}
