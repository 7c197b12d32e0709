//! Standard scaling: (x - mean) / std

use crate::error::{PrepError, Result};
use super::artifact::NumericColumnParams;
use super::ColumnType;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Z-score scaler over a fixed, ordered set of numeric columns.
///
/// Uses the population standard deviation, so a fitted column has unit
/// variance when measured the same way. Nulls and NaN are skipped while
/// fitting and come out of `transform` as NaN. Constant columns are centered
/// with a divisor of 1.0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scaler {
    params: Vec<NumericColumnParams>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new, unfitted scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a fitted scaler from stored parameters
    pub fn from_params(params: Vec<NumericColumnParams>) -> Self {
        Self {
            params,
            is_fitted: true,
        }
    }

    /// Fit the scaler to `columns` of `df`, in the given order
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut params = Vec::with_capacity(columns.len());

        for col_name in columns {
            let ca = numeric_column(df, col_name)?;
            params.push(Self::compute_params(col_name, &ca)?);
        }

        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Standardize the fitted columns of `df` into an `(n_rows, n_columns)` matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }

        let mut out = Array2::<f64>::zeros((df.height(), self.params.len()));

        for (j, params) in self.params.iter().enumerate() {
            let ca = numeric_column(df, &params.name)?;
            for (i, value) in (&ca).into_iter().enumerate() {
                out[[i, j]] = params.scale(value.unwrap_or(f64::NAN));
            }
        }

        Ok(out)
    }

    /// Map standardized values back to the original units
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }
        if data.ncols() != self.params.len() {
            return Err(PrepError::Data(format!(
                "expected {} scaled columns, got {}",
                self.params.len(),
                data.ncols()
            )));
        }

        let mut out = data.clone();
        for (mut column, params) in out.columns_mut().into_iter().zip(&self.params) {
            column.mapv_inplace(|v| params.unscale(v));
        }
        Ok(out)
    }

    /// Learned parameters, in output order
    pub fn params(&self) -> &[NumericColumnParams] {
        &self.params
    }

    /// Columns whose standard deviation was zero at fit time
    pub fn constant_columns(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.is_constant())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Number of output columns
    pub fn n_features_out(&self) -> usize {
        self.params.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn compute_params(name: &str, ca: &Float64Chunked) -> Result<NumericColumnParams> {
        // NaN and infinities count as missing, like nulls
        let valid: Float64Chunked = ca
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        // min == max is exact; a computed std can be a rounding residue
        let constant = valid.min() == valid.max();
        let (mean, std) = if constant {
            (valid.min().unwrap_or(0.0), 0.0)
        } else {
            (valid.mean().unwrap_or(0.0), valid.std(0).unwrap_or(0.0))
        };

        if !mean.is_finite() || !std.is_finite() {
            return Err(PrepError::Data(format!(
                "column '{}' has non-finite statistics (mean {}, std {})",
                name, mean, std
            )));
        }

        Ok(NumericColumnParams {
            name: name.to_string(),
            mean,
            std,
        })
    }
}

/// Fetch `name` from `df` as Float64, rejecting non-numeric dtypes
fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df
        .column(name)
        .map_err(|_| PrepError::FeatureNotFound(name.to_string()))?;

    if ColumnType::from_dtype(column.dtype()) != ColumnType::Numeric {
        return Err(PrepError::Data(format!(
            "column '{}' has dtype {}, expected a numeric dtype",
            name,
            column.dtype()
        )));
    }

    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_mean_std(matrix: &Array2<f64>, j: usize) -> (f64, f64) {
        let col = matrix.column(j);
        let n = col.len() as f64;
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn test_standard_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut scaler = Scaler::new();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let (mean, std) = column_mean_std(&result, 0);
        assert!(mean.abs() < 1e-10);
        assert!((std - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_population_std() {
        let df = df!("age" => &[20i64, 30, 40]).unwrap();

        let mut scaler = Scaler::new();
        let result = scaler.fit_transform(&df, &["age"]).unwrap();

        assert!((scaler.params()[0].mean - 30.0).abs() < 1e-12);
        assert!((result[[0, 0]] + 1.224744871391589).abs() < 1e-9);
        assert!(result[[1, 0]].abs() < 1e-12);
        assert!((result[[2, 0]] - 1.224744871391589).abs() < 1e-9);
    }

    #[test]
    fn test_constant_column_is_zero() {
        let df = df!("c" => &[0.1, 0.1, 0.1], "d" => &[1.0, 2.0, 3.0]).unwrap();

        let mut scaler = Scaler::new();
        let result = scaler.fit_transform(&df, &["c", "d"]).unwrap();

        assert_eq!(scaler.constant_columns(), vec!["c"]);
        assert_eq!(scaler.params()[0].std, 0.0);
        assert!(result.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_nulls_are_skipped_and_emitted_as_nan() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0)]).unwrap();

        let mut scaler = Scaler::new();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        assert!((scaler.params()[0].mean - 2.0).abs() < 1e-12);
        assert!((scaler.params()[0].std - 1.0).abs() < 1e-12);
        assert!(result[[1, 0]].is_nan());
        assert!((result[[0, 0]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_column_reuse_keeps_deviation() {
        let train = df!("c" => &[5.0, 5.0, 5.0]).unwrap();
        let mut scaler = Scaler::new();
        let fitted = scaler.fit_transform(&train, &["c"]).unwrap();
        assert!(fitted.iter().all(|&v| v == 0.0));

        let new_rows = df!("c" => &[5.0, 9.0]).unwrap();
        let result = scaler.transform(&new_rows).unwrap();
        assert_eq!(result.column(0).to_vec(), vec![0.0, 4.0]);
    }

    #[test]
    fn test_nan_is_treated_as_missing() {
        let df = df!("x" => &[1.0, f64::NAN, 3.0]).unwrap();

        let mut scaler = Scaler::new();
        let result = scaler.fit_transform(&df, &["x"]).unwrap();

        let params = &scaler.params()[0];
        assert!((params.mean - 2.0).abs() < 1e-12);
        assert!((params.std - 1.0).abs() < 1e-12);
        assert!(!params.is_constant());
        assert!((result[[0, 0]] + 1.0).abs() < 1e-12);
        assert!(result[[1, 0]].is_nan());
        assert!((result[[2, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_nan_column_learns_zero_params() {
        let df = df!("x" => &[f64::NAN, f64::NAN]).unwrap();
        let mut scaler = Scaler::new();
        scaler.fit(&df, &["x"]).unwrap();
        assert_eq!((scaler.params()[0].mean, scaler.params()[0].std), (0.0, 0.0));
    }

    #[test]
    fn test_overflowing_column_is_data_error() {
        let df = df!("x" => &[f64::MAX, -f64::MAX, f64::MAX]).unwrap();
        let mut scaler = Scaler::new();
        assert!(matches!(scaler.fit(&df, &["x"]), Err(PrepError::Data(_))));
    }

    #[test]
    fn test_inverse_transform() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut scaler = Scaler::new();
        let scaled = scaler.fit_transform(&df, &["a"]).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (i, expected) in [1.0, 2.0, 3.0, 4.0, 5.0].iter().enumerate() {
            assert!((restored[[i, 0]] - expected).abs() < 1e-10);
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let df = df!("a" => &[1.0]).unwrap();
        assert!(matches!(Scaler::new().transform(&df), Err(PrepError::NotFitted)));
    }

    #[test]
    fn test_missing_column() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let mut scaler = Scaler::new();
        scaler.fit(&df, &["a"]).unwrap();

        let other = df!("b" => &[1.0, 2.0]).unwrap();
        assert!(matches!(scaler.transform(&other), Err(PrepError::FeatureNotFound(_))));
    }

    #[test]
    fn test_string_column_rejected() {
        let df = df!("a" => &["x", "y"]).unwrap();
        let mut scaler = Scaler::new();
        assert!(matches!(scaler.fit(&df, &["a"]), Err(PrepError::Data(_))));
    }
}
