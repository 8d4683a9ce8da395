//! Feature scaling
//!
//! The scaler is fit offline; this module only applies it. Supported
//! transforms:
//! - Standardization: `(x - mean) / scale`
//! - Min-max: `x * scale + min`

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, InferenceError};
use crate::features::{FeatureVector, ScaledVector, FEATURE_COLUMNS, FEATURE_COUNT};

/// A fitted numeric transform applied to every column before inference
pub trait Scaler: Send + Sync {
    /// Number of columns the transform was fit on
    fn n_features(&self) -> usize;

    fn transform(&self, features: &FeatureVector) -> Result<ScaledVector, InferenceError>;
}

/// Standardization with per-column mean and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        check_width("scaler mean", self.mean.len())?;
        check_width("scaler scale", self.scale.len())?;
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ArtifactError::invalid("scaler", "mean contains non-finite values"));
        }
        if let Some(index) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(ArtifactError::invalid(
                "scaler",
                format!("scale for column {} must be finite and non-zero", FEATURE_COLUMNS[index]),
            ));
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &FeatureVector) -> Result<ScaledVector, InferenceError> {
        check_input(self.n_features(), features)?;
        Ok(ScaledVector::new(
            features
                .as_slice()
                .iter()
                .zip(self.mean.iter().zip(&self.scale))
                .map(|(x, (mean, scale))| (x - mean) / scale)
                .collect(),
        ))
    }
}

/// Min-max rescaling with per-column offset and factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl MinMaxScaler {
    pub fn new(min: Vec<f64>, scale: Vec<f64>) -> Result<Self, ArtifactError> {
        let scaler = Self { min, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        check_width("scaler min", self.min.len())?;
        check_width("scaler scale", self.scale.len())?;
        if self.min.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(ArtifactError::invalid("scaler", "parameters contain non-finite values"));
        }
        Ok(())
    }
}

impl Scaler for MinMaxScaler {
    fn n_features(&self) -> usize {
        self.min.len()
    }

    fn transform(&self, features: &FeatureVector) -> Result<ScaledVector, InferenceError> {
        check_input(self.n_features(), features)?;
        Ok(ScaledVector::new(
            features
                .as_slice()
                .iter()
                .zip(self.min.iter().zip(&self.scale))
                .map(|(x, (min, scale))| x * scale + min)
                .collect(),
        ))
    }
}

/// On-disk scaler document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    MinMax {
        min: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
}

impl ScalerArtifact {
    /// Validate and build the scaler.
    ///
    /// When the document records the column names it was fit on, they must
    /// match [`FEATURE_COLUMNS`] exactly, order included.
    pub fn build(self) -> Result<Box<dyn Scaler>, ArtifactError> {
        match self {
            ScalerArtifact::Standard {
                mean,
                scale,
                feature_names,
            } => {
                check_feature_names("scaler", feature_names.as_deref())?;
                Ok(Box::new(StandardScaler::new(mean, scale)?))
            }
            ScalerArtifact::MinMax {
                min,
                scale,
                feature_names,
            } => {
                check_feature_names("scaler", feature_names.as_deref())?;
                Ok(Box::new(MinMaxScaler::new(min, scale)?))
            }
        }
    }
}

pub(crate) fn check_width(artifact: &str, actual: usize) -> Result<(), ArtifactError> {
    if actual != FEATURE_COUNT {
        return Err(ArtifactError::FeatureCount {
            artifact: artifact.to_string(),
            expected: FEATURE_COUNT,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn check_feature_names(
    artifact: &str,
    names: Option<&[String]>,
) -> Result<(), ArtifactError> {
    let Some(names) = names else {
        return Ok(());
    };
    check_width(artifact, names.len())?;
    for (index, (actual, expected)) in names.iter().zip(FEATURE_COLUMNS).enumerate() {
        if actual != expected {
            return Err(ArtifactError::FeatureName {
                artifact: artifact.to_string(),
                index,
                expected: expected.to_string(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}

fn check_input(expected: usize, features: &FeatureVector) -> Result<(), InferenceError> {
    let actual = features.as_slice().len();
    if actual != expected {
        return Err(InferenceError::WidthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones() -> Vec<f64> {
        vec![1.0; FEATURE_COUNT]
    }

    fn row() -> FeatureVector {
        FeatureVector([2.0, 0.0, 5.0, 0.0, 200.0, 1.0, 1500.0, 800.0, 3.0, 300.0, 3.0, 2000.0])
    }

    #[test]
    fn test_standard_transform() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[4] = 100.0;
        let mut scale = ones();
        scale[4] = 50.0;
        scale[6] = 500.0;
        let scaler = StandardScaler::new(mean, scale).unwrap();

        let scaled = scaler.transform(&row()).unwrap();
        assert_eq!(scaled.len(), FEATURE_COUNT);
        assert_eq!(scaled.as_slice()[0], 2.0);
        assert_eq!(scaled.as_slice()[4], 2.0);
        assert_eq!(scaled.as_slice()[6], 3.0);
    }

    #[test]
    fn test_min_max_transform() {
        let mut scale = ones();
        scale[11] = 0.001;
        let scaler = MinMaxScaler::new(vec![-1.0; FEATURE_COUNT], scale).unwrap();

        let scaled = scaler.transform(&row()).unwrap();
        assert_eq!(scaled.as_slice()[0], 1.0);
        assert!((scaled.as_slice()[11] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut scale = ones();
        scale[2] = 0.0;
        let err = StandardScaler::new(vec![0.0; FEATURE_COUNT], scale).unwrap_err();
        assert!(err.to_string().contains("Trip_Days"));
    }

    #[test]
    fn test_wrong_width_rejected() {
        let err = StandardScaler::new(vec![0.0; 11], vec![1.0; 11]).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::FeatureCount {
                expected: 12,
                actual: 11,
                ..
            }
        ));
    }

    #[test]
    fn test_artifact_feature_names_checked() {
        let mut names: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
        let artifact = ScalerArtifact::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: ones(),
            feature_names: Some(names.clone()),
        };
        assert!(artifact.build().is_ok());

        names.swap(6, 7);
        let artifact = ScalerArtifact::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: ones(),
            feature_names: Some(names),
        };
        match artifact.build() {
            Err(ArtifactError::FeatureName { index, .. }) => assert_eq!(index, 6),
            other => panic!("expected feature name error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_artifact_from_json() {
        let json = r#"{"kind": "min_max", "min": [0,0,0,0,0,0,0,0,0,0,0,0], "scale": [1,1,1,1,1,1,1,1,1,1,1,1]}"#;
        let artifact: ScalerArtifact = serde_json::from_str(json).unwrap();
        let scaler = artifact.build().unwrap();
        assert_eq!(scaler.n_features(), FEATURE_COUNT);
        assert_eq!(scaler.transform(&row()).unwrap().as_slice(), row().as_slice());
    }
}
