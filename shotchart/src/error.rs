//! Error types for the shot-chart ETL pipeline.
//!
//! Each layer owns its error enum:
//!
//! - [`CsvError`] - reading and writing tabular files
//! - [`ConfigError`] - loading transform configs and team directories
//! - [`TransformError`] - fatal transform failures
//! - [`StoreError`] - relational store access
//! - [`PipelineError`] - top-level orchestration errors used by the CLI
//!
//! Fatal transform and load failures are wrapped in [`TransformFailure`] and
//! [`LoadFailure`], which keep the partial report so the caller can still
//! persist it. Conversion is automatic via `From`, so `?` works across layers.

use thiserror::Error;

use crate::load::report::{LoadReport, LoadStep};
use crate::transform::report::TransformReport;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a tabular file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Content could not be decoded to text.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No header row.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document does not match its embedded JSON schema.
    #[error("Config failed schema validation: {errors:?}")]
    Schema { errors: Vec<String> },

    /// The document is well-formed but semantically unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Transform Errors
// =============================================================================

/// Hard failures of the transform engine. Everything else degrades to warnings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// Required columns absent from the table.
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),
}

/// A fatal transform error together with the report built up to that point.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct TransformFailure {
    pub error: TransformError,
    pub report: TransformReport,
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A load step that aborted, with the report covering the steps that committed.
#[derive(Debug, Error)]
#[error("Load step '{step}' failed: {error}")]
pub struct LoadFailure {
    pub step: LoadStep,
    pub error: StoreError,
    pub report: LoadReport,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformFailure),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Load error: {0}")]
    Load(#[from] LoadFailure),

    #[error("Failed to write report: {0}")]
    Report(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
