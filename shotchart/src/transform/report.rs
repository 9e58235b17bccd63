//! Transformation report.
//!
//! Accumulates one [`StepSummary`] per stage plus the warnings and fatal
//! errors raised along the way. Serialized as the transform log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TransformError;
use crate::logs::{log_error, log_info, log_success, log_warning_indent};

/// Metrics recorded by each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepSummary {
    LoadData {
        rows: usize,
        /// Null cells per column, only columns with at least one.
        missing_values: BTreeMap<String, usize>,
    },
    StandardizeShotTypes {
        unique_types: usize,
        unmapped: Vec<String>,
    },
    CleanCoordinates {
        rows_dropped: usize,
        rows_remaining: usize,
    },
    ValidateShotDistance {
        out_of_range: usize,
        avg_distance: Option<f64>,
    },
    AddDerivedColumns {
        new_columns: Vec<String>,
    },
    ValidateDataQuality {
        final_rows: usize,
        null_count: usize,
    },
    SelectFinalColumns {
        columns: Vec<String>,
    },
}

impl StepSummary {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadData { .. } => "load_data",
            Self::StandardizeShotTypes { .. } => "standardize_shot_types",
            Self::CleanCoordinates { .. } => "clean_coordinates",
            Self::ValidateShotDistance { .. } => "validate_shot_distance",
            Self::AddDerivedColumns { .. } => "add_derived_columns",
            Self::ValidateDataQuality { .. } => "validate_data_quality",
            Self::SelectFinalColumns { .. } => "select_final_columns",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    pub start_rows: usize,
    pub end_rows: usize,
    pub steps: Vec<StepSummary>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TransformReport {
    pub fn new(start_rows: usize) -> Self {
        Self {
            start_rows,
            end_rows: 0,
            steps: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append a stage's summary and warnings.
    pub fn record(&mut self, step: StepSummary, warnings: Vec<String>) {
        for warning in &warnings {
            log_warning_indent(warning.as_str(), 1);
        }
        log_success(format!("{} done", step.name()));
        self.steps.push(step);
        self.warnings.extend(warnings);
    }

    /// Record a fatal error and close the report.
    pub fn fail(&mut self, error: &TransformError) {
        log_error(error.to_string());
        self.errors.push(error.to_string());
        self.finished_at = Some(Utc::now());
    }

    pub fn finish(&mut self, end_rows: usize) {
        self.end_rows = end_rows;
        self.finished_at = Some(Utc::now());
    }

    pub fn rows_dropped(&self) -> usize {
        self.start_rows.saturating_sub(self.end_rows)
    }

    /// Summary of the run, one line per entry.
    pub fn log_summary(&self) {
        log_info(format!("Input rows: {}", self.start_rows));
        log_info(format!("Output rows: {}", self.end_rows));
        log_info(format!("Rows removed: {}", self.rows_dropped()));
        if !self.warnings.is_empty() {
            log_info(format!("Warnings: {}", self.warnings.len()));
            for warning in &self.warnings {
                log_warning_indent(warning.as_str(), 1);
            }
        }
        if self.errors.is_empty() {
            log_success("No errors");
        } else {
            for error in &self.errors {
                log_error(error.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_in_order() {
        let mut report = TransformReport::new(3);
        report.record(
            StepSummary::CleanCoordinates { rows_dropped: 1, rows_remaining: 2 },
            vec!["1 shots with null coordinates".into()],
        );
        report.record(StepSummary::AddDerivedColumns { new_columns: vec![] }, vec![]);
        report.finish(2);

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].name(), "clean_coordinates");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.rows_dropped(), 1);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_step_serializes_with_tag() {
        let step = StepSummary::ValidateShotDistance { out_of_range: 1, avg_distance: Some(47.5) };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step"], "validate_shot_distance");
        assert_eq!(json["out_of_range"], 1);
        assert_eq!(json["avg_distance"], 47.5);
    }

    #[test]
    fn test_fail_records_error() {
        let mut report = TransformReport::new(1);
        report.fail(&TransformError::MissingColumns(vec!["LOC_X".into()]));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("LOC_X"));
    }

    #[test]
    fn test_report_json_fields() {
        let json = serde_json::to_value(TransformReport::new(5)).unwrap();
        for field in ["start_rows", "end_rows", "steps", "warnings", "errors", "started_at"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
