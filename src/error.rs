use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Failure to build the dataset. No partial dataset is ever returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parquet error in {path}: {source}")]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("Arrow error in {path}: {source}")]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("cohort '{cohort}' not found in {source_name}")]
    MissingCohort { cohort: String, source_name: String },

    #[error("unsupported source {0}: expected a workbook (.xlsx, .xlsm, .xls, .ods) or a directory")]
    UnsupportedSource(PathBuf),

    #[error("invalid cohort list: {0}")]
    InvalidCohorts(String),

    #[error("malformed table '{cohort}': {reason}")]
    Malformed { cohort: String, reason: String },
}

// ---------------------------------------------------------------------------
// Aggregation and views
// ---------------------------------------------------------------------------

/// The category column is absent from the records handed to the aggregator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("the data has no column named '{field}' ({missing} of {total} rows lack it)")]
    MissingField {
        field: String,
        missing: usize,
        total: usize,
    },
}

/// Why a single cohort view could not be produced. Other views are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("unknown cohort '{0}'")]
    UnknownCohort(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid palette colour '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("invalid min_count range: {0}")]
    InvalidRange(String),
}
