//! Configuration schema (erdforge.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::diagnostic::{DiagnosticCode, Severity};

/// Target language for generated model source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTarget {
    /// Python SQLModel classes
    #[default]
    SqlModel,

    /// Rust structs with serde derives
    Rust,
}

impl std::str::FromStr for ModelTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlmodel" => Ok(Self::SqlModel),
            "rust" => Ok(Self::Rust),
            other => Err(ConfigError::ParseError(format!("unknown model target '{}'", other))),
        }
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Frontend tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Regions narrower than this are treated as noise (pixels)
    pub min_region_width: f64,

    /// Regions shorter than this are treated as noise (pixels)
    pub min_region_height: f64,

    /// Synthetic attributes assigned to a region without readable text
    pub placeholder_attributes: usize,

    /// Confidence reported by the text frontend
    pub text_confidence: f64,

    /// Confidence reported by the region frontend
    pub image_confidence: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_region_width: 40.0,
            min_region_height: 18.0,
            placeholder_attributes: 3,
            text_confidence: 0.9,
            image_confidence: 0.8,
        }
    }
}

/// Code generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Refuse to emit DDL/migrations with foreign keys to missing tables
    pub strict_references: bool,

    /// Execute generated SQL on an in-memory SQLite database before writing it
    pub verify_sql: bool,

    /// Language of generated model source
    pub model_target: ModelTarget,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            strict_references: true,
            verify_sql: false,
            model_target: ModelTarget::default(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("text_confidence", self.extraction.text_confidence),
            ("image_confidence", self.extraction.image_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue(format!(
                    "extraction.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.extraction.min_region_width < 0.0 || self.extraction.min_region_height < 0.0 {
            return Err(ConfigError::InvalidValue(
                "extraction region thresholds must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
