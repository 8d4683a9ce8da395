//! Loading the fitted scaler and models from a model directory
//!
//! Expected layout (file names configurable through [`ArtifactConfig`]):
//!
//! ```text
//! models/
//!   reg_model.json   regression model   {"kind": "linear" | "forest" | "gradient_boosting", ...}
//!   clf_model.json   classifier         {"kind": "logistic" | "forest", ...}
//!   scaler.json      feature scaler     {"kind": "standard" | "min_max", ...}
//! ```
//!
//! Any failure here is fatal for the caller: there is no per-request retry.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::config::ArtifactConfig;
use crate::error::ArtifactError;
use crate::model::{Classifier, ClassifierArtifact, Regressor, RegressorArtifact};
use crate::scaler::{Scaler, ScalerArtifact};

/// The three fitted artifacts, validated and ready for inference
pub struct ArtifactSet {
    pub scaler: Box<dyn Scaler>,
    pub regressor: Box<dyn Regressor>,
    pub classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ArtifactSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactSet")
            .field("scaler_features", &self.scaler.n_features())
            .field("regressor_features", &self.regressor.n_features())
            .field("classifier_features", &self.classifier.n_features())
            .finish()
    }
}

impl ArtifactSet {
    /// Load all three artifacts from `config.dir`.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactError> {
        let dir = Path::new(&config.dir);
        let scaler: ScalerArtifact = read_json(&dir.join(&config.scaler))?;
        let regressor: RegressorArtifact = read_json(&dir.join(&config.regression))?;
        let classifier: ClassifierArtifact = read_json(&dir.join(&config.classification))?;

        Ok(Self {
            scaler: scaler.build()?,
            regressor: regressor.build()?,
            classifier: classifier.build()?,
        })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let display = path.to_string_lossy().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ArtifactError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::Parse {
        path: display,
        message: e.to_string(),
    })
}
