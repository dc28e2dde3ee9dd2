// ============================================================
// Layer 4 — IDX Dataset Loader
// ============================================================
// Loads an MNIST-style dataset stored in the IDX binary format.
//
// Expected files in the data directory:
//   train-images-idx3-ubyte   train-labels-idx1-ubyte
//   t10k-images-idx3-ubyte    t10k-labels-idx1-ubyte
//
// IDX layout (all integers big-endian):
//   images: magic 0x00000803, count, rows, cols, then
//           count * rows * cols unsigned bytes
//   labels: magic 0x00000801, count, then count unsigned bytes
//
// Pixels are converted to f32 without rescaling, so the
// formatted data stays in 0–255 intensity units.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading Files)

use anyhow::{bail, Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::dataset::{DataSplit, Features, LabeledImages};
use crate::domain::traits::DatasetSource;

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES:  &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS:  &str = "t10k-labels-idx1-ubyte";

/// Loads the train/test split from a directory of IDX files.
/// Implements the DatasetSource trait from Layer 3.
pub struct IdxLoader {
    dir:         PathBuf,
    train_limit: Option<usize>,
    test_limit:  Option<usize>,
}

impl IdxLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), train_limit: None, test_limit: None }
    }

    /// Keep only the first `train` / `test` examples of each split
    pub fn with_limits(mut self, train: Option<usize>, test: Option<usize>) -> Self {
        self.train_limit = train;
        self.test_limit  = test;
        self
    }

    fn load_split(&self, images: &str, labels: &str, limit: Option<usize>) -> Result<LabeledImages> {
        let features = read_images(&self.dir.join(images))?;
        let targets  = read_labels(&self.dir.join(labels))?;
        let mut split = LabeledImages::new(features, targets)
            .with_context(|| format!("'{images}' and '{labels}' disagree"))?;
        if let Some(limit) = limit {
            split.truncate(limit);
        }
        Ok(split)
    }
}

impl DatasetSource for IdxLoader {
    fn load(&self) -> Result<DataSplit> {
        tracing::info!("Loading IDX dataset from '{}'", self.dir.display());
        let train = self.load_split(TRAIN_IMAGES, TRAIN_LABELS, self.train_limit)?;
        let test  = self.load_split(TEST_IMAGES, TEST_LABELS, self.test_limit)?;
        tracing::info!("Loaded {} training and {} test images", train.len(), test.len());
        Ok(DataSplit { train, test })
    }
}

fn read_images(path: &Path) -> Result<Features> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read image file '{}'", path.display()))?;
    parse_images(&bytes).with_context(|| format!("Malformed image file '{}'", path.display()))
}

fn read_labels(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read label file '{}'", path.display()))?;
    parse_labels(&bytes).with_context(|| format!("Malformed label file '{}'", path.display()))
}

fn be_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    match bytes.get(offset..offset + 4) {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None    => bail!("truncated header at byte {offset}"),
    }
}

/// Parse an IDX3 image buffer
pub fn parse_images(bytes: &[u8]) -> Result<Features> {
    let magic = be_u32(bytes, 0)?;
    if magic != IMAGES_MAGIC {
        bail!("expected image magic {IMAGES_MAGIC:#010x}, found {magic:#010x}");
    }
    let count = be_u32(bytes, 4)? as usize;
    let rows  = be_u32(bytes, 8)? as usize;
    let cols  = be_u32(bytes, 12)? as usize;
    let body  = &bytes[16..];
    let Some(expected) = count.checked_mul(rows).and_then(|n| n.checked_mul(cols)) else {
        bail!("header claims {count} {rows}x{cols} images, more than can be addressed");
    };
    if body.len() != expected {
        bail!("expected {expected} pixel bytes for {count} {rows}x{cols} images, found {}", body.len());
    }
    let pixels = body.iter().map(|&b| b as f32).collect();
    Ok(Features::new(pixels, rows, cols)?)
}

/// Parse an IDX1 label buffer
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    let magic = be_u32(bytes, 0)?;
    if magic != LABELS_MAGIC {
        bail!("expected label magic {LABELS_MAGIC:#010x}, found {magic:#010x}");
    }
    let count = be_u32(bytes, 4)? as usize;
    let body  = &bytes[8..];
    if body.len() != count {
        bail!("expected {count} labels, found {}", body.len());
    }
    Ok(body.to_vec())
}
