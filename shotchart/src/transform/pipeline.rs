//! Transform engine entry points.
//!
//! Runs the seven cleaning stages in a fixed order and folds their summaries
//! into a [`TransformReport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use shotchart::transform::{transform_csv, TransformConfig};
//! use std::path::Path;
//!
//! let output = transform_csv(Path::new("data/shots.csv"), &TransformConfig::default())?;
//! println!("{} shots kept", output.table.len());
//! ```

use serde::Serialize;
use std::path::Path;

use super::config::TransformConfig;
use super::report::TransformReport;
use super::stages::{
    clean_coordinates, derive_columns, normalize_columns, select_final_columns,
    standardize_shot_types, validate_distance, validate_required_columns, StageOutput,
};
use crate::error::{PipelineError, TransformFailure};
use crate::logs::{log_info, log_success};
use crate::parser::{read_table, ParseResult};
use crate::table::Table;

/// The cleaned table and the report describing how it was produced.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub table: Table,
    pub report: TransformReport,
}

/// Source file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.table.columns().to_vec(),
            row_count: parsed.table.len(),
        }
    }
}

/// Clean a raw shot table.
///
/// Only a missing required column aborts the run; the failure carries the
/// report accumulated up to that stage.
pub fn transform(raw: Table, config: &TransformConfig) -> Result<TransformOutput, TransformFailure> {
    log_info(format!("Transforming {} shots", raw.len()));
    let mut report = TransformReport::new(raw.len());

    let table = apply(&mut report, normalize_columns(raw));
    let table = apply(&mut report, standardize_shot_types(table, config));
    let table = apply(&mut report, clean_coordinates(table));
    let table = apply(&mut report, validate_distance(table, &config.valid_distance_range));
    let table = apply(&mut report, derive_columns(table, config));

    let table = match validate_required_columns(table, &config.required_columns) {
        Ok(output) => apply(&mut report, output),
        Err(error) => {
            report.fail(&error);
            return Err(TransformFailure { error, report });
        }
    };

    let table = apply(&mut report, select_final_columns(table));
    report.finish(table.len());
    log_success(format!("Cleaned {} of {} shots", report.end_rows, report.start_rows));

    Ok(TransformOutput { table, report })
}

fn apply(report: &mut TransformReport, output: StageOutput) -> Table {
    report.record(output.step, output.warnings);
    output.table
}

/// Read a CSV file with encoding and delimiter detection, then transform it.
pub fn transform_csv(path: &Path, config: &TransformConfig) -> Result<TransformOutput, PipelineError> {
    log_info(format!("Reading {}", path.display()));
    let parsed = read_table(path)?;
    let info = CsvInfo::from(&parsed);
    log_success(format!(
        "Read {} rows ({}, separator {:?})",
        info.row_count, info.encoding, info.delimiter
    ));

    Ok(transform(parsed.table, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::parser::parse_str;

    const RAW: &str = "\
GAME_ID,GAME_DATE,PLAYER_ID,SHOT_TYPE,SHOT_MADE_FLAG,LOC_X,LOC_Y,SHOT_DISTANCE,PERIOD,api_extraction_season,api_extraction_season_type
1,20031029,2544,2PT Field Goal,1,10,20,5,1,2003,Regular Season
1,20031029,2544,3PT Field Goal,0,,30,25,2,2003,Regular Season
1,20031029,2544,Heave,0,200,400,90,4,2003,Regular Season
";

    #[test]
    fn test_transform_runs_all_stages() {
        let raw = parse_str(RAW, ',').unwrap();
        let output = transform(raw, &TransformConfig::default()).unwrap();

        assert_eq!(output.report.steps.len(), 7);
        assert_eq!(output.report.start_rows, 3);
        assert_eq!(output.report.end_rows, 2);
        assert_eq!(output.table.len(), 2);
        assert_eq!(output.report.warnings.len(), 3);
        assert!(output.report.errors.is_empty());
    }

    #[test]
    fn test_failure_keeps_partial_report() {
        let raw = parse_str("GAME_ID,LOC_X,LOC_Y\n1,0,0\n", ',').unwrap();
        let failure = transform(raw, &TransformConfig::default()).unwrap_err();

        assert!(matches!(failure.error, TransformError::MissingColumns(_)));
        assert_eq!(failure.report.steps.len(), 5);
        assert_eq!(failure.report.errors.len(), 1);
    }

    #[test]
    fn test_transform_is_stable_on_cleaned_output() {
        let config = TransformConfig {
            required_columns: vec!["GAME_ID".into(), "SHOT_TYPE_STD".into()],
            ..TransformConfig::default()
        };
        let raw = parse_str(RAW, ',').unwrap();
        let once = transform(raw, &config).unwrap().table;
        let twice = transform(once.clone(), &config).unwrap().table;
        assert_eq!(once, twice);
    }
}
