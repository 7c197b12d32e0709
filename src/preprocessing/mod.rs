//! Data preprocessing module
//!
//! Turns a mixed-type table into a numeric feature matrix:
//! - Column classification by declared dtype
//! - Standard scaling (z-score) of numeric columns
//! - One-hot encoding of categorical columns
//! - A versioned, language-neutral artifact for the fitted state

mod artifact;
mod config;
mod encoder;
mod pipeline;
mod scaler;

pub use artifact::{CategoricalColumnParams, NumericColumnParams, PreprocessorArtifact, ARTIFACT_FORMAT_VERSION};
pub use config::{HandleUnknown, PreprocessingConfig, UnsupportedColumnPolicy, DEFAULT_ARTIFACT_PATH};
pub use encoder::Encoder;
pub use pipeline::{apply, build_and_fit, DataPreprocessor};
pub use scaler::Scaler;

use crate::error::{PrepError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    Unsupported,
}

impl ColumnType {
    /// Classify a polars dtype. Every dtype maps to exactly one variant.
    pub fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
            DataType::Float32 | DataType::Float64 => ColumnType::Numeric,
            DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _) => {
                ColumnType::Categorical
            }
            _ => ColumnType::Unsupported,
        }
    }
}

/// Disjoint split of a table's columns by [`ColumnType`], in table order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    /// Unsupported columns as `(name, dtype)`
    pub unsupported: Vec<(String, String)>,
}

impl ColumnPartition {
    /// Classify every column of `df`
    pub fn from_frame(df: &DataFrame) -> Self {
        let mut partition = Self::default();

        for col in df.get_columns() {
            let name = col.name().to_string();
            match ColumnType::from_dtype(col.dtype()) {
                ColumnType::Numeric => partition.numeric.push(name),
                ColumnType::Categorical => partition.categorical.push(name),
                ColumnType::Unsupported => {
                    partition.unsupported.push((name, col.dtype().to_string()))
                }
            }
        }

        partition
    }

    /// Classify `df` and apply the unsupported-column policy.
    ///
    /// With [`UnsupportedColumnPolicy::Drop`] each unsupported column is logged and
    /// left out; with [`UnsupportedColumnPolicy::Fail`] the first one is an error.
    pub fn resolve(df: &DataFrame, policy: UnsupportedColumnPolicy) -> Result<Self> {
        let partition = Self::from_frame(df);

        if let Some((name, dtype)) = partition.unsupported.first() {
            if policy == UnsupportedColumnPolicy::Fail {
                return Err(PrepError::UnsupportedColumn {
                    name: name.clone(),
                    dtype: dtype.clone(),
                });
            }
        }

        for (name, dtype) in &partition.unsupported {
            warn!(column = %name, dtype = %dtype, "Dropping column with unsupported dtype");
        }

        Ok(partition)
    }

    /// Names of the unsupported columns
    pub fn dropped_names(&self) -> Vec<String> {
        self.unsupported.iter().map(|(name, _)| name.clone()).collect()
    }

    /// True when there is nothing to transform
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.categorical.is_empty()
    }
}
