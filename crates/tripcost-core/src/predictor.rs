//! Encode → scale → predict
//!
//! A [`Predictor`] is built once at startup and shared read-only. Every
//! request builds its own feature vector; nothing is cached between calls.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactSet;
use crate::codes::CategoryLabel;
use crate::error::{ArtifactError, Result};
use crate::features::{self, FeatureVector, RawTripFields, ScaledVector, FEATURE_COUNT};
use crate::model::{Classifier, Regressor};
use crate::scaler::Scaler;

/// What the user asked to predict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    #[default]
    #[serde(alias = "Total Trip Cost")]
    TotalTripCost,
    #[serde(alias = "Cost Category")]
    CostCategory,
    #[serde(alias = "Both")]
    Both,
}

impl PredictionTarget {
    pub const ALL: [PredictionTarget; 3] = [Self::TotalTripCost, Self::CostCategory, Self::Both];

    /// Label shown in the target selector.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TotalTripCost => "Total Trip Cost",
            Self::CostCategory => "Cost Category",
            Self::Both => "Both",
        }
    }

    /// Value submitted by the form.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TotalTripCost => "total_trip_cost",
            Self::CostCategory => "cost_category",
            Self::Both => "both",
        }
    }

    pub fn wants_cost(&self) -> bool {
        matches!(self, Self::TotalTripCost | Self::Both)
    }

    pub fn wants_category(&self) -> bool {
        matches!(self, Self::CostCategory | Self::Both)
    }
}

impl fmt::Display for PredictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for PredictionTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.key() == wanted || t.display_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown prediction target: {}", s))
    }
}

/// Result of one prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutcome {
    pub target: PredictionTarget,
    /// Encoded row before scaling
    pub features: FeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryLabel>,
}

/// Shared inference handles
pub struct Predictor {
    scaler: Box<dyn Scaler>,
    regressor: Box<dyn Regressor>,
    classifier: Box<dyn Classifier>,
}

impl fmt::Debug for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predictor")
            .field("n_features", &self.scaler.n_features())
            .finish_non_exhaustive()
    }
}

impl Predictor {
    /// Build a predictor, checking every handle was fit on the encoder's width.
    pub fn new(
        scaler: Box<dyn Scaler>,
        regressor: Box<dyn Regressor>,
        classifier: Box<dyn Classifier>,
    ) -> std::result::Result<Self, ArtifactError> {
        for (artifact, width) in [
            ("scaler", scaler.n_features()),
            ("regression model", regressor.n_features()),
            ("classification model", classifier.n_features()),
        ] {
            if width != FEATURE_COUNT {
                return Err(ArtifactError::FeatureCount {
                    artifact: artifact.to_string(),
                    expected: FEATURE_COUNT,
                    actual: width,
                });
            }
        }
        Ok(Self {
            scaler,
            regressor,
            classifier,
        })
    }

    pub fn from_artifacts(set: ArtifactSet) -> std::result::Result<Self, ArtifactError> {
        Self::new(set.scaler, set.regressor, set.classifier)
    }

    pub fn encode(&self, raw: &RawTripFields) -> Result<FeatureVector> {
        Ok(features::encode(raw)?)
    }

    pub fn scale(&self, features: &FeatureVector) -> Result<ScaledVector> {
        Ok(self.scaler.transform(features)?)
    }

    pub fn predict_cost(&self, scaled: &ScaledVector) -> Result<f64> {
        Ok(self.regressor.predict(scaled)?)
    }

    /// Classify and map the code through the category table.
    pub fn predict_category(&self, scaled: &ScaledVector) -> Result<CategoryLabel> {
        let code = self.classifier.predict(scaled)?;
        Ok(CategoryLabel::from_code(code))
    }

    /// Run the full pipeline, invoking only the models `target` needs.
    pub fn predict(&self, raw: &RawTripFields, target: PredictionTarget) -> Result<PredictionOutcome> {
        let features = self.encode(raw)?;
        let scaled = self.scale(&features)?;

        let cost = if target.wants_cost() {
            Some(self.predict_cost(&scaled)?)
        } else {
            None
        };
        let category = if target.wants_category() {
            Some(self.predict_category(&scaled)?)
        } else {
            None
        };

        Ok(PredictionOutcome {
            target,
            features,
            cost,
            category,
        })
    }
}
