//! One-hot encoding of categorical columns

use crate::error::{PrepError, Result};
use super::artifact::CategoricalColumnParams;
use super::config::HandleUnknown;
use super::ColumnType;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One-hot encoder.
///
/// Each fitted column expands into one indicator column per vocabulary entry.
/// Vocabularies are sorted so the output layout only depends on the set of
/// values seen, not on row order. Nulls encode as an all-zero block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Encoder {
    handle_unknown: HandleUnknown,
    columns: Vec<CategoricalColumnParams>,
    is_fitted: bool,
}

impl Encoder {
    /// Create a new encoder
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            columns: Vec::new(),
            is_fitted: false,
        }
    }

    /// Rebuild a fitted encoder from stored vocabularies
    pub fn from_params(columns: Vec<CategoricalColumnParams>, handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            columns,
            is_fitted: true,
        }
    }

    /// Fit the encoder to `columns` of `df`, in the given order
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut fitted = Vec::with_capacity(columns.len());

        for col_name in columns {
            let ca = categorical_column(df, col_name)?;
            let vocabulary: BTreeSet<&str> = (&ca).into_iter().flatten().collect();

            fitted.push(CategoricalColumnParams {
                name: col_name.to_string(),
                vocabulary: vocabulary.into_iter().map(str::to_string).collect(),
            });
        }

        self.columns = fitted;
        self.is_fitted = true;
        Ok(self)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Expand the fitted columns of `df` into indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }

        let mut out = Array2::<f64>::zeros((df.height(), self.n_features_out()));
        let mut offset = 0;

        for column in &self.columns {
            let ca = categorical_column(df, &column.name)?;
            let mut unknown = 0usize;

            for (row, value) in (&ca).into_iter().enumerate() {
                let Some(value) = value else { continue };
                match column.index_of(value) {
                    Some(idx) => out[[row, offset + idx]] = 1.0,
                    None if self.handle_unknown == HandleUnknown::Error => {
                        return Err(PrepError::UnknownCategory {
                            column: column.name.clone(),
                            value: value.to_string(),
                        });
                    }
                    None => unknown += 1,
                }
            }

            if unknown > 0 {
                debug!(column = %column.name, rows = unknown, "Unseen categories encoded as zeros");
            }

            offset += column.vocabulary.len();
        }

        Ok(out)
    }

    /// Vocabulary learned for `column`
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.vocabulary.as_slice())
    }

    /// Learned vocabularies, in output order
    pub fn params(&self) -> &[CategoricalColumnParams] {
        &self.columns
    }

    /// Output column names, `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.vocabulary.iter().map(move |cat| format!("{}_{}", c.name, cat)))
            .collect()
    }

    /// Number of output columns (sum of vocabulary sizes)
    pub fn n_features_out(&self) -> usize {
        self.columns.iter().map(|c| c.vocabulary.len()).sum()
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

/// Fetch `name` from `df` as a string column, rejecting other dtypes
fn categorical_column(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df
        .column(name)
        .map_err(|_| PrepError::FeatureNotFound(name.to_string()))?;

    if ColumnType::from_dtype(column.dtype()) != ColumnType::Categorical {
        return Err(PrepError::Data(format!(
            "column '{}' has dtype {}, expected a string or categorical dtype",
            name,
            column.dtype()
        )));
    }

    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series.str()?.clone())
}
