//! Configuration for tripcost
//!
//! Server address, model artifact locations, and display settings. Loaded
//! from TOML, then overridden from the environment.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:8080"
//!
//! [artifacts]
//! dir = "/srv/tripcost/models"
//! regression = "reg_model.json"
//! classification = "clf_model.json"
//! scaler = "scaler.json"
//!
//! [display]
//! currency_symbol = "₹"
//! title = "Intelligent Travel Cost Predictor"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TRIPCOST_CONFIG";
/// Environment override for the listen address
pub const ADDR_ENV: &str = "TRIPCOST_ADDR";
/// Environment override for the model directory
pub const MODEL_DIR_ENV: &str = "TRIPCOST_MODEL_DIR";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripCostConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub display: DisplayConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Where the fitted artifacts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding the three artifact files
    pub dir: String,
    pub regression: String,
    pub classification: String,
    pub scaler: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: "models".to_string(),
            regression: "reg_model.json".to_string(),
            classification: "clf_model.json".to_string(),
            scaler: "scaler.json".to_string(),
        }
    }
}

/// Page presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub title: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            title: "Intelligent Travel Cost Predictor".to_string(),
        }
    }
}

impl TripCostConfig {
    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Candidate config files, highest precedence first.
    ///
    /// An explicit path wins, then `$TRIPCOST_CONFIG`, then `./tripcost.toml`,
    /// then `<config dir>/tripcost/config.toml`.
    pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("tripcost.toml"));
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tripcost").join("config.toml"));
        }
        paths
    }

    /// Load from the first existing standard location, apply environment
    /// overrides, and validate.
    ///
    /// An explicit path that does not exist is an error; the implicit
    /// locations are skipped when absent.
    pub fn load_standard(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::Io(format!("{}: not found", path.display())));
            }
        }

        let source = Self::search_paths(explicit).into_iter().find(|p| p.is_file());
        let mut config = match &source {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok((config, source))
    }

    /// Apply `TRIPCOST_ADDR` / `TRIPCOST_MODEL_DIR` style overrides.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup(ADDR_ENV).filter(|v| !v.is_empty()) {
            self.server.addr = addr;
        }
        if let Some(dir) = lookup(MODEL_DIR_ENV).filter(|v| !v.is_empty()) {
            self.artifacts.dir = dir;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.addr.parse::<SocketAddr>().map_err(|e| {
            ConfigError::Invalid(format!("server.addr {:?}: {}", self.server.addr, e))
        })?;

        for (key, value) in [
            ("artifacts.dir", &self.artifacts.dir),
            ("artifacts.regression", &self.artifacts.regression),
            ("artifacts.classification", &self.artifacts.classification),
            ("artifacts.scaler", &self.artifacts.scaler),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = TripCostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.artifacts.regression, "reg_model.json");
        assert_eq!(config.display.currency_symbol, "₹");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = TripCostConfig::default();
        config.server.addr = "0.0.0.0:9000".to_string();
        let toml = config.to_toml().unwrap();
        let parsed = TripCostConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TripCostConfig::from_toml(
            r#"
[artifacts]
dir = "/srv/models"
"#,
        )
        .unwrap();
        assert_eq!(config.artifacts.dir, "/srv/models");
        assert_eq!(config.artifacts.scaler, "scaler.json");
        assert_eq!(config.server.addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = TripCostConfig::default();
        config.server.addr = "localhost".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_file_name() {
        let mut config = TripCostConfig::default();
        config.artifacts.classification = " ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("artifacts.classification"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [(ADDR_ENV, "0.0.0.0:3000"), (MODEL_DIR_ENV, "/tmp/m")]
            .into_iter()
            .collect();
        let mut config = TripCostConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.addr, "0.0.0.0:3000");
        assert_eq!(config.artifacts.dir, "/tmp/m");
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[display]\ncurrency_symbol = \"$\"\n").unwrap();
        file.flush().unwrap();

        let (config, source) = TripCostConfig::load_standard(Some(file.path())).unwrap();
        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = TripCostConfig::load_standard(Some(Path::new("/nonexistent/tripcost.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            TripCostConfig::from_toml("server = 5"),
            Err(ConfigError::Parse(_))
        ));
    }
}
