//! Tripcost Core - trip cost prediction from fitted models
//!
//! This crate turns the attributes of a planned trip into model predictions:
//!
//! - **Codes**: fixed label ↔ code tables for City, Season, Flight Type,
//!   Hotel Class, Transport Mode, and the predicted Cost Category
//! - **Features**: validation and assembly of the 12-column model input row
//! - **Scaler**: the fitted standardization / min-max transform
//! - **Model**: fitted regressors and classifiers (linear, logistic, tree ensembles)
//! - **Artifacts**: loading and validating the three JSON artifacts at startup
//! - **Predictor**: encode → scale → predict, invoking only the models asked for
//! - **Format**: currency display
//! - **Config**: server, artifact, and display settings
//!
//! # Pipeline
//!
//! ```text
//! RawTripFields ──encode──▶ FeatureVector ──scale──▶ ScaledVector ─┬─▶ Regressor  ─▶ cost
//!                                                                  └─▶ Classifier ─▶ CategoryLabel
//! ```
//!
//! The scaler and models are loaded once and shared by reference; nothing in
//! the pipeline mutates them.

pub mod artifacts;
pub mod codes;
pub mod config;
pub mod error;
pub mod features;
pub mod format;
pub mod model;
pub mod predictor;
pub mod scaler;

pub use artifacts::ArtifactSet;
pub use codes::{
    Categorical, CategoryLabel, City, CostCategory, FlightType, HotelClass, Season, TransportMode,
};
pub use config::{ArtifactConfig, DisplayConfig, ServerConfig, TripCostConfig};
pub use error::{ArtifactError, ConfigError, EncodeError, InferenceError, Result, TripCostError};
pub use features::{
    encode, whole_number, FeatureVector, RawTripFields, ScaledVector, TripDetails, FEATURE_COLUMNS,
    FEATURE_COUNT,
};
pub use format::format_currency;
pub use model::{Classifier, ClassifierArtifact, Regressor, RegressorArtifact};
pub use predictor::{PredictionOutcome, PredictionTarget, Predictor};
pub use scaler::{Scaler, ScalerArtifact};

/// Returns the version of tripcost-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
