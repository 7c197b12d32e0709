//! tabprep - Tabular preprocessing for numeric feature matrices
//!
//! Fits a pipeline on a mixed-type table and produces an `ndarray` matrix:
//! numeric columns are standardized, categorical columns are one-hot
//! encoded, and the fitted state is saved as a versioned JSON artifact so
//! later tables can be projected the same way.
//!
//! # Modules
//!
//! - [`preprocessing`] - Column classification, scaling, encoding, artifacts
//! - [`error`] - Error type shared by the library
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use polars::prelude::*;
//! use tabprep::prelude::*;
//!
//! # fn main() -> tabprep::Result<()> {
//! let df = df!("age" => &[20i64, 30, 40], "city" => &["NY", "LA", "NY"])?;
//! let config = PreprocessingConfig::new().with_artifact_path("prep.json");
//!
//! let (matrix, _) = build_and_fit(&df, &config)?;
//! let again = apply(&df, "prep.json")?;
//! assert_eq!(matrix, again);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Preprocessing
pub mod preprocessing;

// Services
pub mod cli;

pub use error::{PrepError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PrepError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        apply, build_and_fit, ColumnPartition, ColumnType, DataPreprocessor, Encoder,
        HandleUnknown, PreprocessingConfig, PreprocessorArtifact, Scaler,
        UnsupportedColumnPolicy,
    };
}
