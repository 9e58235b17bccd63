//! # Shotchart - player shot-chart ETL
//!
//! Cleans raw shot-chart records pulled from the stats API and normalizes
//! them into a relational store of teams, games and shots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Raw CSV   │────▶│  Transform  │────▶│ Cleaned CSV │────▶│   Loader    │──▶ SQLite
//! │ (per season)│     │ (7 stages)  │     │  + report   │     │ (4 steps)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shotchart::{load, transform_csv, SqliteStore, TeamDirectory, TransformConfig};
//!
//! let output = transform_csv("data/raw/shots.csv".as_ref(), &TransformConfig::default())?;
//! let store = SqliteStore::open("data/shotchart.db");
//! store.migrate()?;
//! let report = load(&output.table, &TeamDirectory::nba(), &store)?;
//! println!("{} shots stored", report.stats.shots);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Pipeline log helpers and report writer
//! - [`models`] - Shot types and relational rows
//! - [`table`] - Flat in-memory table
//! - [`parser`] - CSV reading and writing with auto-detection
//! - [`directory`] - Team directory
//! - [`validation`] - JSON schema validation of config files
//! - [`transform`] - Cleaning pipeline
//! - [`load`] - Relational loader

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Tabular data
pub mod parser;
pub mod table;

// Reference data and config validation
pub mod directory;
pub mod validation;

// Pipeline
pub mod load;
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, LoadFailure, PipelineError, PipelineResult, StoreError,
    TransformError, TransformFailure,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use directory::TeamDirectory;
pub use models::{GameRow, SeasonType, ShotRow, ShotType, TeamRow};
pub use table::Table;

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_str, read_table,
    write_table, write_table_file, ParseResult,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    transform, transform_csv, DistanceBucket, DistanceRange, StepSummary, TransformConfig,
    TransformOutput, TransformReport,
};

// =============================================================================
// Re-exports - Load
// =============================================================================

pub use load::{
    load, load_csv, LoadReport, LoadStage, LoadStep, Loader, ShotKey, SqliteStore, TableCounts,
};
