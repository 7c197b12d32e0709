//! tabprep CLI Module
//!
//! Command-line interface for fitting a preprocessor, applying a saved one,
//! and inspecting artifacts.

use clap::{Parser, Subcommand};
use colored::*;
use ndarray::Array2;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::preprocessing::{
    build_and_fit, DataPreprocessor, PreprocessingConfig, PreprocessorArtifact,
    UnsupportedColumnPolicy,
};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tabprep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Standardize numeric columns and one-hot encode categorical columns")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit a preprocessor on a table and save its fitted state
    Fit {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact path (overrides the config file)
        #[arg(short, long)]
        artifact: Option<PathBuf>,

        /// Write the transformed matrix as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reject tables with unsupported columns instead of dropping them
        #[arg(long)]
        strict: bool,
    },

    /// Transform a table with a previously saved preprocessor
    Apply {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact written by `fit`
        #[arg(short, long)]
        artifact: PathBuf,

        /// Write the transformed matrix as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the contents of a saved artifact
    Inspect {
        /// Artifact written by `fit`
        #[arg(short, long)]
        artifact: PathBuf,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let df = match ext {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "json" => JsonReader::new(std::fs::File::open(path)?)
            .finish()?,
        "ndjson" | "jsonl" => JsonReader::new(std::fs::File::open(path)?)
            .with_json_format(JsonFormat::JsonLines)
            .finish()?,
        "parquet" => ParquetReader::new(std::fs::File::open(path)?)
            .finish()?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };

    Ok(df)
}

fn write_matrix(
    preprocessor: &DataPreprocessor,
    matrix: &Array2<f64>,
    output_path: &Path,
) -> anyhow::Result<()> {
    step_run(&format!("Saving → {}", output_path.display()));
    let mut frame = preprocessor.to_frame(matrix)?;
    let mut file = std::fs::File::create(output_path)?;
    CsvWriter::new(&mut file).finish(&mut frame)?;
    step_done(&format!("{} rows × {} cols", frame.height(), frame.width()));
    Ok(())
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_fit(
    data_path: &Path,
    artifact_path: Option<&Path>,
    output_path: Option<&Path>,
    config_path: Option<&Path>,
    strict: bool,
) -> anyhow::Result<()> {
    section("Fit");

    let mut config = match config_path {
        Some(path) => PreprocessingConfig::from_toml_file(path)?,
        None => PreprocessingConfig::default(),
    };
    if let Some(path) = artifact_path {
        config = config.with_artifact_path(path);
    }
    if strict {
        config = config.with_unsupported_columns(UnsupportedColumnPolicy::Fail);
    }

    step_run("Loading data");
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Fitting");
    let start = Instant::now();
    let (matrix, preprocessor) = build_and_fit(&df, &config)?;
    step_done(&format!("{:?}", start.elapsed()));

    let partition = preprocessor.partition();
    println!("  {}", kv("Numeric", &partition.numeric.join(", ")));
    println!("  {}", kv("Categorical", &partition.categorical.join(", ")));
    if !partition.unsupported.is_empty() {
        println!("  {}", kv("Dropped", &partition.dropped_names().join(", ")));
    }
    println!("  {}", kv("Features out", &preprocessor.n_features_out().to_string()));
    println!("  {}", kv("Artifact", &config.artifact_path.display().to_string()));

    if let Some(path) = output_path {
        write_matrix(&preprocessor, &matrix, path)?;
    }

    println!();
    Ok(())
}

pub fn cmd_apply(
    data_path: &Path,
    artifact_path: &Path,
    output_path: Option<&Path>,
) -> anyhow::Result<()> {
    section("Apply");

    step_run("Loading artifact");
    let preprocessor = DataPreprocessor::load(artifact_path)?;
    step_done(&format!("{} features", preprocessor.n_features_out()));

    step_run("Loading data");
    let df = load_data(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Transforming");
    let start = Instant::now();
    let matrix = preprocessor.transform(&df)?;
    step_done(&format!("{:?}", start.elapsed()));

    if let Some(path) = output_path {
        write_matrix(&preprocessor, &matrix, path)?;
    }

    println!();
    Ok(())
}

pub fn cmd_inspect(artifact_path: &Path) -> anyhow::Result<()> {
    section("Artifact");

    let artifact = PreprocessorArtifact::read(artifact_path)?;

    println!("  {}", kv("File", &artifact_path.display().to_string()));
    println!("  {}", kv("Version", &artifact.format_version.to_string()));
    println!("  {}", kv("Unknown", &format!("{:?}", artifact.handle_unknown).to_lowercase()));
    if !artifact.dropped_columns.is_empty() {
        println!("  {}", kv("Dropped", &artifact.dropped_columns.join(", ")));
    }
    println!();

    if !artifact.numeric_columns.is_empty() {
        println!("  {:<20} {:>14} {:>14}", muted("Column"), muted("Mean"), muted("Std"));
        println!("  {}", dim(&"─".repeat(50)));
        for params in &artifact.numeric_columns {
            let std = format!("{:>14.6}", params.std);
            println!(
                "  {:<20} {:>14.6} {}",
                params.name,
                params.mean,
                if params.is_constant() { std.yellow() } else { std.normal() }
            );
        }
        println!();
    }

    if !artifact.categorical_columns.is_empty() {
        println!("  {:<20} {:>6}  {}", muted("Column"), muted("Size"), muted("Vocabulary"));
        println!("  {}", dim(&"─".repeat(50)));
        for params in &artifact.categorical_columns {
            println!(
                "  {:<20} {:>6}  {}",
                params.name,
                params.vocabulary.len(),
                dim(&params.vocabulary.join(", "))
            );
        }
        println!();
    }

    Ok(())
}
