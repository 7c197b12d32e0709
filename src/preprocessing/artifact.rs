//! Versioned on-disk representation of a fitted preprocessor
//!
//! The artifact is plain JSON with explicit field names so that it can be
//! produced and consumed outside of Rust:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "handle_unknown": "ignore",
//!   "numeric_columns": [{ "name": "age", "mean": 30.0, "std": 8.16496580927726 }],
//!   "categorical_columns": [{ "name": "city", "vocabulary": ["LA", "NY"] }],
//!   "dropped_columns": []
//! }
//! ```

use crate::error::{PrepError, Result};
use super::config::HandleUnknown;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Schema version written by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Learned standardization parameters for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumnParams {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation (ddof = 0). Zero for constant columns.
    pub std: f64,
}

impl NumericColumnParams {
    /// True when the column carried no spread at fit time
    pub fn is_constant(&self) -> bool {
        self.std == 0.0
    }

    /// Divisor used by [`scale`](Self::scale); 1.0 for constant columns
    pub fn divisor(&self) -> f64 {
        if self.is_constant() { 1.0 } else { self.std }
    }

    /// Standardize a single value
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.divisor()
    }

    /// Undo [`scale`](Self::scale)
    pub fn unscale(&self, value: f64) -> f64 {
        value * self.divisor() + self.mean
    }
}

/// Learned vocabulary for one categorical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalColumnParams {
    pub name: String,
    /// Distinct non-null values seen at fit time, sorted
    pub vocabulary: Vec<String>,
}

impl CategoricalColumnParams {
    /// Position of `value` in the vocabulary
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|probe| probe.as_str().cmp(value))
            .ok()
    }
}

/// Fitted transform state as persisted on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessorArtifact {
    pub format_version: u32,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
    pub numeric_columns: Vec<NumericColumnParams>,
    pub categorical_columns: Vec<CategoricalColumnParams>,
    #[serde(default)]
    pub dropped_columns: Vec<String>,
}

impl PreprocessorArtifact {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an artifact
    pub fn from_json(text: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(text)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact, replacing any existing file at `path`
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Wrote preprocessor artifact");
        Ok(())
    }

    /// Read an artifact from `path`
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(PrepError::UnsupportedArtifactVersion {
                found: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }

        for column in &self.numeric_columns {
            if !column.mean.is_finite() || !column.std.is_finite() || column.std < 0.0 {
                return Err(PrepError::Serialization(format!(
                    "column '{}' has invalid parameters (mean {}, std {})",
                    column.name, column.mean, column.std
                )));
            }
        }

        for column in &self.categorical_columns {
            if column.vocabulary.windows(2).any(|w| w[0] >= w[1]) {
                return Err(PrepError::Serialization(format!(
                    "vocabulary of column '{}' is not sorted and unique",
                    column.name
                )));
            }
        }

        Ok(())
    }
}
