//! Relational loader.
//!
//! - Store: SQLite schema, connections and statements
//! - Report: step progression, per-step metrics and verification
//! - Loader: the four load steps

pub mod loader;
pub mod report;
pub mod store;

pub use loader::{load, Loader};
pub use report::{LoadReport, LoadStage, LoadStep, LoadStepSummary, Verification};
pub use store::{ShotKey, SqliteStore, TableCounts};

use std::path::Path;

use crate::directory::TeamDirectory;
use crate::error::PipelineError;
use crate::logs::log_success;
use crate::parser::read_table;

/// Read a cleaned CSV file and load it.
pub fn load_csv(
    path: &Path,
    directory: &TeamDirectory,
    store: &SqliteStore,
) -> Result<LoadReport, PipelineError> {
    let parsed = read_table(path)?;
    log_success(format!("Read {} cleaned shots from {}", parsed.table.len(), path.display()));
    Ok(load(&parsed.table, directory, store)?)
}
