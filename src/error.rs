//! Error types for tabprep

use thiserror::Error;

/// Result type alias for tabprep operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for the preprocessing pipeline
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Preprocessor not fitted")]
    NotFitted,

    #[error("Unsupported column '{name}' with dtype {dtype}")]
    UnsupportedColumn { name: String, dtype: String },

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedArtifactVersion { found: u32, supported: u32 },
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        PrepError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for PrepError {
    fn from(err: toml::de::Error) -> Self {
        PrepError::Config(err.to_string())
    }
}
