//! Data preprocessing pipeline

use crate::error::{PrepError, Result};
use super::{
    artifact::{PreprocessorArtifact, ARTIFACT_FORMAT_VERSION},
    config::PreprocessingConfig,
    encoder::Encoder,
    scaler::Scaler,
    ColumnPartition,
};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Main data preprocessing pipeline
///
/// Standardizes numeric columns and one-hot encodes categorical columns,
/// emitting the numeric block first and the categorical block second.
#[derive(Debug, Clone)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    partition: ColumnPartition,
    scaler: Scaler,
    encoder: Encoder,
    is_fitted: bool,
}

impl DataPreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        let encoder = Encoder::new(config.handle_unknown);
        Self {
            config,
            partition: ColumnPartition::default(),
            scaler: Scaler::new(),
            encoder,
            is_fitted: false,
        }
    }

    /// Fit the preprocessor to the data
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();

        let partition = ColumnPartition::resolve(df, self.config.unsupported_columns)?;

        let numeric: Vec<&str> = partition.numeric.iter().map(|s| s.as_str()).collect();
        let mut scaler = Scaler::new();
        scaler.fit(df, &numeric)?;

        if self.config.warn_on_zero_variance {
            for column in scaler.constant_columns() {
                warn!(column = %column, "Zero-variance column, centering without scaling");
            }
        }

        let categorical: Vec<&str> = partition.categorical.iter().map(|s| s.as_str()).collect();
        let mut encoder = Encoder::new(self.config.handle_unknown);
        encoder.fit(df, &categorical)?;

        self.partition = partition;
        self.scaler = scaler;
        self.encoder = encoder;
        self.is_fitted = true;

        info!(
            rows = df.height(),
            numeric = self.partition.numeric.len(),
            categorical = self.partition.categorical.len(),
            dropped = self.partition.unsupported.len(),
            features_out = self.n_features_out(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted preprocessor"
        );

        Ok(self)
    }

    /// Transform the data into a `(rows, n_features_out)` matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }

        let numeric = self.scaler.transform(df)?;
        let categorical = self.encoder.transform(df)?;

        concatenate(Axis(1), &[numeric.view(), categorical.view()])
            .map_err(|e| PrepError::Data(e.to_string()))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Transform the data into a DataFrame whose columns carry the feature names
    pub fn transform_to_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        let matrix = self.transform(df)?;
        self.to_frame(&matrix)
    }

    /// Label the columns of an output matrix with [`feature_names_out`](Self::feature_names_out)
    pub fn to_frame(&self, matrix: &Array2<f64>) -> Result<DataFrame> {
        if matrix.ncols() != self.n_features_out() {
            return Err(PrepError::Data(format!(
                "expected {} output columns, got {}",
                self.n_features_out(),
                matrix.ncols()
            )));
        }

        let columns: Vec<Column> = self
            .feature_names_out()
            .into_iter()
            .zip(matrix.columns())
            .map(|(name, values)| Column::new(name.into(), values.to_vec()))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Output column names: numeric columns as-is, then `<column>_<category>`
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scaler.params().iter().map(|p| p.name.clone()).collect();
        names.extend(self.encoder.feature_names());
        names
    }

    pub fn n_features_out(&self) -> usize {
        self.scaler.n_features_out() + self.encoder.n_features_out()
    }

    pub fn partition(&self) -> &ColumnPartition {
        &self.partition
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Snapshot of the fitted state in its on-disk form
    pub fn to_artifact(&self) -> Result<PreprocessorArtifact> {
        if !self.is_fitted {
            return Err(PrepError::NotFitted);
        }

        Ok(PreprocessorArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            handle_unknown: self.encoder.handle_unknown(),
            numeric_columns: self.scaler.params().to_vec(),
            categorical_columns: self.encoder.params().to_vec(),
            dropped_columns: self.partition.dropped_names(),
        })
    }

    /// Rebuild a fitted preprocessor from an artifact
    pub fn from_artifact(artifact: PreprocessorArtifact) -> Self {
        let partition = ColumnPartition {
            numeric: artifact.numeric_columns.iter().map(|p| p.name.clone()).collect(),
            categorical: artifact.categorical_columns.iter().map(|p| p.name.clone()).collect(),
            // dtypes of dropped columns are not persisted
            unsupported: artifact
                .dropped_columns
                .into_iter()
                .map(|name| (name, "unknown".to_string()))
                .collect(),
        };

        let config = PreprocessingConfig::default().with_handle_unknown(artifact.handle_unknown);

        Self {
            scaler: Scaler::from_params(artifact.numeric_columns),
            encoder: Encoder::from_params(artifact.categorical_columns, artifact.handle_unknown),
            config,
            partition,
            is_fitted: true,
        }
    }

    /// Save the fitted state to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_artifact()?.write(path)
    }

    /// Load a fitted preprocessor saved with [`save`](Self::save)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let artifact = PreprocessorArtifact::read(path)?;
        let mut preprocessor = Self::from_artifact(artifact);
        preprocessor.config.artifact_path = path.to_path_buf();
        Ok(preprocessor)
    }
}

impl Default for DataPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fit a preprocessor on `df`, transform it, and persist the fitted state to
/// `config.artifact_path`.
pub fn build_and_fit(
    df: &DataFrame,
    config: &PreprocessingConfig,
) -> Result<(Array2<f64>, DataPreprocessor)> {
    let mut preprocessor = DataPreprocessor::with_config(config.clone());
    let matrix = preprocessor.fit_transform(df)?;
    preprocessor.save(&config.artifact_path)?;

    info!(
        path = %config.artifact_path.display(),
        rows = matrix.nrows(),
        cols = matrix.ncols(),
        "Saved preprocessor artifact"
    );

    Ok((matrix, preprocessor))
}

/// Project `df` through the fitted state stored at `artifact_path`.
///
/// Columns of `df` that were not fitted are ignored.
pub fn apply(df: &DataFrame, artifact_path: impl AsRef<Path>) -> Result<Array2<f64>> {
    DataPreprocessor::load(artifact_path)?.transform(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{HandleUnknown, UnsupportedColumnPolicy};

    fn create_test_dataframe() -> DataFrame {
        df!(
            "age" => &[20i64, 30, 40],
            "city" => &["NY", "LA", "NY"],
        )
        .unwrap()
    }

    fn temp_artifact(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tabprep_pipeline_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_preprocessor_creation() {
        let preprocessor = DataPreprocessor::new();
        assert!(!preprocessor.is_fitted());
        assert_eq!(preprocessor.n_features_out(), 0);
    }

    #[test]
    fn test_fit_transform() {
        let mut preprocessor = DataPreprocessor::new();
        let result = preprocessor.fit_transform(&create_test_dataframe()).unwrap();

        assert_eq!(result.dim(), (3, 3));
        assert!((result[[0, 0]] + 1.224744871391589).abs() < 1e-9);
        assert!(result[[1, 0]].abs() < 1e-12);
        assert!((result[[2, 0]] - 1.224744871391589).abs() < 1e-9);

        let onehot: Vec<Vec<f64>> = (0..3).map(|i| vec![result[[i, 1]], result[[i, 2]]]).collect();
        assert_eq!(onehot, vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_feature_names() {
        let mut preprocessor = DataPreprocessor::new();
        preprocessor.fit(&create_test_dataframe()).unwrap();
        assert_eq!(preprocessor.feature_names_out(), vec!["age", "city_LA", "city_NY"]);
    }

    #[test]
    fn test_transform_to_frame() {
        let mut preprocessor = DataPreprocessor::new();
        preprocessor.fit(&create_test_dataframe()).unwrap();

        let frame = preprocessor.transform_to_frame(&create_test_dataframe()).unwrap();
        assert_eq!(frame.shape(), (3, 3));
        let la = frame.column("city_LA").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_eq!(la.get(1), Some(1.0));
    }

    #[test]
    fn test_transform_before_fit() {
        let preprocessor = DataPreprocessor::new();
        let result = preprocessor.transform(&create_test_dataframe());
        assert!(matches!(result, Err(PrepError::NotFitted)));
        assert!(matches!(preprocessor.to_artifact(), Err(PrepError::NotFitted)));
    }

    #[test]
    fn test_unsupported_columns_dropped() {
        let df = df!(
            "x" => &[1.0, 2.0],
            "flag" => &[true, false],
        )
        .unwrap();

        let mut preprocessor = DataPreprocessor::new();
        let result = preprocessor.fit_transform(&df).unwrap();

        assert_eq!(result.ncols(), 1);
        assert_eq!(preprocessor.partition().dropped_names(), vec!["flag"]);
        assert_eq!(preprocessor.to_artifact().unwrap().dropped_columns, vec!["flag"]);
    }

    #[test]
    fn test_unsupported_columns_fail() {
        let df = df!("x" => &[1.0, 2.0], "flag" => &[true, false]).unwrap();
        let config = PreprocessingConfig::new().with_unsupported_columns(UnsupportedColumnPolicy::Fail);

        let mut preprocessor = DataPreprocessor::with_config(config);
        assert!(matches!(
            preprocessor.fit(&df),
            Err(PrepError::UnsupportedColumn { .. })
        ));
        assert!(!preprocessor.is_fitted());
    }

    #[test]
    fn test_artifact_roundtrip_preserves_transform() {
        let df = create_test_dataframe();
        let mut preprocessor = DataPreprocessor::new();
        let expected = preprocessor.fit_transform(&df).unwrap();

        let restored = DataPreprocessor::from_artifact(preprocessor.to_artifact().unwrap());
        assert_eq!(restored.transform(&df).unwrap(), expected);
        assert_eq!(restored.partition().numeric, vec!["age"]);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_artifact("save_load");
        let config = PreprocessingConfig::new().with_handle_unknown(HandleUnknown::Error);

        let mut preprocessor = DataPreprocessor::with_config(config);
        preprocessor.fit(&create_test_dataframe()).unwrap();
        preprocessor.save(&path).unwrap();

        let loaded = DataPreprocessor::load(&path).unwrap();
        assert!(loaded.is_fitted());
        assert_eq!(loaded.encoder().handle_unknown(), HandleUnknown::Error);
        assert_eq!(loaded.config().artifact_path, path);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_build_and_fit_then_apply() {
        let path = temp_artifact("build_apply");
        let config = PreprocessingConfig::new().with_artifact_path(&path);

        let (matrix, _) = build_and_fit(&create_test_dataframe(), &config).unwrap();
        assert!(path.exists());

        let new_rows = df!(
            "city" => &["LA", "SF"],
            "age" => &[30i64, 50],
            "extra" => &[1.0, 2.0],
        )
        .unwrap();
        let applied = apply(&new_rows, &path).unwrap();

        assert_eq!(applied.dim(), (2, matrix.ncols()));
        assert!(applied[[0, 0]].abs() < 1e-12);
        assert_eq!(applied.row(0).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!((applied[[1, 1]], applied[[1, 2]]), (0.0, 0.0));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_apply_missing_column() {
        let path = temp_artifact("missing_col");
        let config = PreprocessingConfig::new().with_artifact_path(&path);
        build_and_fit(&create_test_dataframe(), &config).unwrap();

        let df = df!("age" => &[25i64]).unwrap();
        assert!(matches!(apply(&df, &path), Err(PrepError::FeatureNotFound(name)) if name == "city"));

        std::fs::remove_file(&path).ok();
    }
}
