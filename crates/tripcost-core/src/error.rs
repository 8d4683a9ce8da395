//! Error types for tripcost-core

use thiserror::Error;

/// Result type alias for tripcost operations
pub type Result<T> = std::result::Result<T, TripCostError>;

/// Main error type for tripcost operations
#[derive(Error, Debug)]
pub enum TripCostError {
    /// Encoding user input into a feature vector failed
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Loading or validating a model artifact failed
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Scaling or model inference failed
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while turning raw fields into a feature vector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// Label is not in the attribute's code table
    #[error("Unknown {attribute} option: {label:?}")]
    UnknownLabel { attribute: String, label: String },

    /// Numeric field is below its minimum
    #[error("{field} must be at least {min}, got {value}")]
    OutOfRange { field: String, min: f64, value: f64 },

    /// Numeric field is above what the encoder can represent
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: f64 },

    /// Numeric field is NaN or infinite
    #[error("{field} must be a finite number")]
    NonFinite { field: String },
}

/// Errors raised while loading artifacts at startup
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// File could not be read
    #[error("IO error reading {path}: {message}")]
    Io { path: String, message: String },

    /// File is not a valid artifact document
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// Artifact was fit on a different number of columns
    #[error("{artifact} expects {actual} features, the encoder produces {expected}")]
    FeatureCount {
        artifact: String,
        expected: usize,
        actual: usize,
    },

    /// Artifact was fit on differently named or ordered columns
    #[error("{artifact} column {index} is {actual:?}, expected {expected:?}")]
    FeatureName {
        artifact: String,
        index: usize,
        expected: String,
        actual: String,
    },

    /// Parameters are structurally inconsistent
    #[error("Invalid {artifact}: {message}")]
    Invalid { artifact: String, message: String },
}

/// Errors raised by the scaler or a model at inference time
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Input row width does not match the fitted width
    #[error("Input has {actual} values, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    /// Model produced NaN or infinity
    #[error("{model} produced a non-finite output")]
    NonFinite { model: String },

    /// Model has nothing to predict with
    #[error("{model} is empty")]
    Empty { model: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// Config file is not valid TOML for this schema
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// Value is out of valid range
    #[error("Invalid value: {0}")]
    Invalid(String),
}

impl ArtifactError {
    pub(crate) fn invalid(artifact: &str, message: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            artifact: artifact.to_string(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}
