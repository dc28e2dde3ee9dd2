// ============================================================
// Layer 3 — Model Keys
// ============================================================
// A ModelKey is the identity of one trained model. Training
// writes artifacts under `key.storage_name()` and evaluation
// rebuilds the same key from the same range values, so the
// storage name is the only link between the two phases.
//
// Storage names:
//   NoiseCnn_v.0.1_X_<stddev>
//   NoiseCnn_v.0.1_y_<fraction>
//   NoiseCnn_v.0.1_y_<fraction>_<batch size>_<dropout scalar>
//
// Floats are written with the shortest round-trip `{:?}` form,
// which always contains a '.' or an exponent and never the
// delimiter, so distinct finite values give distinct names.
//
// Reference: Rust Book §6 (Enums and Pattern Matching)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::HarnessError;

/// Versioned model-family prefix shared by every artifact name
pub const MODEL_FAMILY: &str = "NoiseCnn_v.0.1";

/// Separator between the components of a storage name
pub const DELIMITER: char = '_';

// ─── NoiseAxis ────────────────────────────────────────────────────────────────
/// Which half of the training data gets corrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseAxis {
    /// Additive Gaussian noise on the input features (tag `X`)
    Features,
    /// Random reassignment of a fraction of the labels (tag `y`)
    Labels,
}

impl NoiseAxis {
    pub fn tag(self) -> &'static str {
        match self {
            NoiseAxis::Features => "X",
            NoiseAxis::Labels   => "y",
        }
    }
}

impl fmt::Display for NoiseAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for NoiseAxis {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X" => Ok(NoiseAxis::Features),
            "y" => Ok(NoiseAxis::Labels),
            other => Err(HarnessError::UnknownAxis(other.to_string())),
        }
    }
}

// ─── Characteristic noise values ──────────────────────────────────────────────
/// Standard deviation of the Gaussian noise added to features,
/// in raw pixel-intensity units.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Stddev(f64);

impl Stddev {
    pub fn new(value: f64) -> Result<Self, HarnessError> {
        if !value.is_finite() || value < 0.0 {
            return Err(HarnessError::InvalidNoise {
                value,
                reason: "stddev must be finite and non-negative".into(),
            });
        }
        // -0.0 would otherwise print as its own storage name
        Ok(Self(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Fraction of training labels to randomise, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct LabelFraction(f64);

impl LabelFraction {
    pub fn new(value: f64) -> Result<Self, HarnessError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(HarnessError::InvalidNoise {
                value,
                reason: "label fraction must lie in [0, 1]".into(),
            });
        }
        Ok(Self(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Multiplier applied to the network's built-in dropout rates
/// (0.25 after the convolutions, 0.5 before the output layer).
/// The scaled rates must stay below 1, hence the [0, 2) range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DropoutScalar(f64);

impl DropoutScalar {
    pub const NONE: DropoutScalar = DropoutScalar(0.0);
    pub const BASE: DropoutScalar = DropoutScalar(1.0);

    pub fn new(value: f64) -> Result<Self, HarnessError> {
        if !value.is_finite() || !(0.0..2.0).contains(&value) {
            return Err(HarnessError::InvalidNoise {
                value,
                reason: "dropout scalar must lie in [0, 2)".into(),
            });
        }
        Ok(Self(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

macro_rules! impl_f64_conversions {
    ($($ty:ident),*) => {$(
        impl TryFrom<f64> for $ty {
            type Error = HarnessError;
            fn try_from(value: f64) -> Result<Self, Self::Error> {
                $ty::new(value)
            }
        }

        impl From<$ty> for f64 {
            fn from(v: $ty) -> f64 {
                v.0
            }
        }
    )*};
}

impl_f64_conversions!(Stddev, LabelFraction, DropoutScalar);

/// Reject a range that repeats a value; two equal points would
/// share one storage name.
pub fn ensure_distinct<T: PartialEq + fmt::Debug>(what: &str, values: &[T]) -> Result<(), HarnessError> {
    for (i, v) in values.iter().enumerate() {
        if values[..i].contains(v) {
            return Err(HarnessError::InvalidConfig(format!("{what} repeat the value {v:?}")));
        }
    }
    Ok(())
}

// ─── AxisSweep ────────────────────────────────────────────────────────────────
/// An ordered single-axis sweep. The axis is fixed once, when the
/// sweep is built; each case carries its own value type.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisSweep {
    Features(Vec<Stddev>),
    Labels(Vec<LabelFraction>),
}

impl AxisSweep {
    /// Validate raw range values for the given axis.
    /// An empty range is a configuration error.
    pub fn from_values(axis: NoiseAxis, values: &[f64]) -> Result<Self, HarnessError> {
        if values.is_empty() {
            return Err(HarnessError::InvalidConfig(format!(
                "the {axis} sweep needs at least one noise value"
            )));
        }
        let sweep = match axis {
            NoiseAxis::Features => AxisSweep::Features(
                values.iter().map(|&v| Stddev::new(v)).collect::<Result<_, _>>()?,
            ),
            NoiseAxis::Labels => AxisSweep::Labels(
                values.iter().map(|&v| LabelFraction::new(v)).collect::<Result<_, _>>()?,
            ),
        };
        ensure_distinct(&format!("the {axis} sweep values"), &sweep.values())?;
        Ok(sweep)
    }

    pub fn axis(&self) -> NoiseAxis {
        match self {
            AxisSweep::Features(_) => NoiseAxis::Features,
            AxisSweep::Labels(_)   => NoiseAxis::Labels,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AxisSweep::Features(v) => v.len(),
            AxisSweep::Labels(v)   => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw characteristic noise values, in sweep order
    pub fn values(&self) -> Vec<f64> {
        match self {
            AxisSweep::Features(v) => v.iter().map(|s| s.value()).collect(),
            AxisSweep::Labels(v)   => v.iter().map(|f| f.value()).collect(),
        }
    }

    /// One key per sweep point, in sweep order
    pub fn keys(&self) -> Vec<ModelKey> {
        match self {
            AxisSweep::Features(v) => v.iter().map(|&stddev| ModelKey::Features { stddev }).collect(),
            AxisSweep::Labels(v)   => v.iter().map(|&fraction| ModelKey::Labels { fraction }).collect(),
        }
    }
}

// ─── ModelKey ─────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelKey {
    /// Single-axis sweep on the features
    Features { stddev: Stddev },
    /// Single-axis sweep on the labels
    Labels { fraction: LabelFraction },
    /// One point of the label-noise × batch size × dropout mesh
    Mesh {
        fraction:       LabelFraction,
        batch_size:     usize,
        dropout_scalar: DropoutScalar,
    },
}

impl ModelKey {
    pub fn axis(&self) -> NoiseAxis {
        match self {
            ModelKey::Features { .. } => NoiseAxis::Features,
            ModelKey::Labels { .. } | ModelKey::Mesh { .. } => NoiseAxis::Labels,
        }
    }

    /// Deterministic file-system name for this key (no extension).
    pub fn storage_name(&self) -> String {
        let d = DELIMITER;
        let tag = self.axis().tag();
        match self {
            ModelKey::Features { stddev } => {
                format!("{MODEL_FAMILY}{d}{tag}{d}{:?}", stddev.value())
            }
            ModelKey::Labels { fraction } => {
                format!("{MODEL_FAMILY}{d}{tag}{d}{:?}", fraction.value())
            }
            ModelKey::Mesh { fraction, batch_size, dropout_scalar } => format!(
                "{MODEL_FAMILY}{d}{tag}{d}{:?}{d}{batch_size}{d}{:?}",
                fraction.value(),
                dropout_scalar.value(),
            ),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKey::Features { stddev } => {
                write!(f, "Gaussian noise stddev {}", stddev.value())
            }
            ModelKey::Labels { fraction } => {
                write!(f, "{} random labels", fraction.value())
            }
            ModelKey::Mesh { fraction, batch_size, dropout_scalar } => write!(
                f,
                "{} random labels, a batch size of {}, and a dropout scalar of {}",
                fraction.value(),
                batch_size,
                dropout_scalar.value(),
            ),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_axis_tags_parse_and_print() {
        assert_eq!("X".parse::<NoiseAxis>().unwrap(), NoiseAxis::Features);
        assert_eq!("y".parse::<NoiseAxis>().unwrap(), NoiseAxis::Labels);
        assert_eq!(NoiseAxis::Features.to_string(), "X");
        assert_eq!(NoiseAxis::Labels.to_string(), "y");
    }

    #[test]
    fn test_unknown_axis_tag_is_rejected() {
        let err = "Y".parse::<NoiseAxis>().unwrap_err();
        assert_eq!(err, HarnessError::UnknownAxis("Y".into()));
    }

    #[test]
    fn test_storage_names() {
        let x = ModelKey::Features { stddev: Stddev::new(50.0).unwrap() };
        assert_eq!(x.storage_name(), "NoiseCnn_v.0.1_X_50.0");

        let y = ModelKey::Labels { fraction: LabelFraction::new(0.1).unwrap() };
        assert_eq!(y.storage_name(), "NoiseCnn_v.0.1_y_0.1");

        let mesh = ModelKey::Mesh {
            fraction:       LabelFraction::new(0.25).unwrap(),
            batch_size:     64,
            dropout_scalar: DropoutScalar::new(1.0).unwrap(),
        };
        assert_eq!(mesh.storage_name(), "NoiseCnn_v.0.1_y_0.25_64_1.0");
    }

    #[test]
    fn test_storage_name_is_deterministic() {
        let key = ModelKey::Mesh {
            fraction:       LabelFraction::new(0.15000000000000002).unwrap(),
            batch_size:     8,
            dropout_scalar: DropoutScalar::new(0.0).unwrap(),
        };
        assert_eq!(key.storage_name(), key.storage_name());
        assert_eq!(key.storage_name(), "NoiseCnn_v.0.1_y_0.15000000000000002_8_0.0");
    }

    #[test]
    fn test_single_axis_and_mesh_names_never_collide() {
        let mut names = HashSet::new();
        let values = [0.0, 0.1, 0.2, 1.0];
        for &v in &values {
            names.insert(ModelKey::Features { stddev: Stddev::new(v).unwrap() }.storage_name());
            names.insert(ModelKey::Labels { fraction: LabelFraction::new(v).unwrap() }.storage_name());
            for batch_size in [32, 64] {
                for s in [0.0, 1.0] {
                    names.insert(
                        ModelKey::Mesh {
                            fraction:       LabelFraction::new(v).unwrap(),
                            batch_size,
                            dropout_scalar: DropoutScalar::new(s).unwrap(),
                        }
                        .storage_name(),
                    );
                }
            }
        }
        assert_eq!(names.len(), values.len() * (2 + 4));
    }

    #[test]
    fn test_noise_values_are_validated() {
        assert!(Stddev::new(-1.0).is_err());
        assert!(Stddev::new(f64::NAN).is_err());
        assert!(LabelFraction::new(1.5).is_err());
        assert!(LabelFraction::new(1.0).is_ok());
        assert!(DropoutScalar::new(2.0).is_err());
        assert!(DropoutScalar::new(1.5).is_ok());
    }

    #[test]
    fn test_axis_sweep_resolves_axis_once() {
        let sweep = AxisSweep::from_values(NoiseAxis::Labels, &[0.0, 0.5]).unwrap();
        assert_eq!(sweep.axis(), NoiseAxis::Labels);
        assert_eq!(sweep.values(), vec![0.0, 0.5]);
        assert!(sweep.keys().iter().all(|k| matches!(k, ModelKey::Labels { .. })));

        // 0.5 fraction is fine, 50.0 is not
        assert!(AxisSweep::from_values(NoiseAxis::Labels, &[50.0]).is_err());
        assert!(AxisSweep::from_values(NoiseAxis::Features, &[50.0]).is_ok());
    }

    #[test]
    fn test_repeated_sweep_values_are_rejected() {
        let err = AxisSweep::from_values(NoiseAxis::Features, &[50.0, 50.0]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));
        // 0.0 and -0.0 are the same point
        assert!(AxisSweep::from_values(NoiseAxis::Labels, &[0.0, -0.0]).is_err());
    }

    #[test]
    fn test_negative_zero_shares_the_zero_name() {
        let pos = ModelKey::Features { stddev: Stddev::new(0.0).unwrap() };
        let neg = ModelKey::Features { stddev: Stddev::new(-0.0).unwrap() };
        assert_eq!(pos, neg);
        assert_eq!(neg.storage_name(), "NoiseCnn_v.0.1_X_0.0");

        let frac = LabelFraction::new(-0.0).unwrap();
        assert!(frac.value().is_sign_positive());
        assert_eq!(DropoutScalar::new(-0.0).unwrap(), DropoutScalar::NONE);
    }

    #[test]
    fn test_empty_axis_sweep_is_a_config_error() {
        let err = AxisSweep::from_values(NoiseAxis::Features, &[]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig(_)));
    }

    #[test]
    fn test_noise_values_serialize_as_plain_numbers() {
        let s = serde_json::to_string(&Stddev::new(12.5).unwrap()).unwrap();
        assert_eq!(s, "12.5");
        assert!(serde_json::from_str::<LabelFraction>("3.0").is_err());
    }
}
