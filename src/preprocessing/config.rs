//! Preprocessing configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the persisted preprocessor artifact
pub const DEFAULT_ARTIFACT_PATH: &str = "artifacts/preprocessor.json";

/// What to do with columns that are neither numeric nor categorical
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnsupportedColumnPolicy {
    /// Exclude the column and log a warning
    #[default]
    Drop,
    /// Reject the table
    Fail,
}

/// How the encoder treats categories that were not seen during fit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Emit an all-zero indicator block
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Configuration for the preprocessing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Where `build_and_fit` writes the fitted state.
    /// The parent directory must already exist.
    pub artifact_path: PathBuf,

    /// Disposition of columns with an unsupported dtype
    pub unsupported_columns: UnsupportedColumnPolicy,

    /// Policy for categories unseen at fit time
    pub handle_unknown: HandleUnknown,

    /// Log a warning for numeric columns with zero variance
    pub warn_on_zero_variance: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            unsupported_columns: UnsupportedColumnPolicy::Drop,
            handle_unknown: HandleUnknown::Ignore,
            warn_on_zero_variance: true,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Builder method to set the artifact location
    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    /// Builder method to set the unsupported-column policy
    pub fn with_unsupported_columns(mut self, policy: UnsupportedColumnPolicy) -> Self {
        self.unsupported_columns = policy;
        self
    }

    /// Builder method to set the unknown-category policy
    pub fn with_handle_unknown(mut self, policy: HandleUnknown) -> Self {
        self.handle_unknown = policy;
        self
    }

    /// Builder method to toggle zero-variance warnings
    pub fn with_zero_variance_warning(mut self, enabled: bool) -> Self {
        self.warn_on_zero_variance = enabled;
        self
    }
}
