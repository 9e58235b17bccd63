//! Cleaning stages.
//!
//! Each stage takes the previous stage's table by value and returns the new
//! table with its report fragment. Stages never touch shared state, so each
//! can be exercised on its own.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

use super::config::{DistanceRange, TransformConfig};
use super::report::StepSummary;
use crate::error::TransformError;
use crate::logs::log_info_indent;
use crate::table::{as_bool, as_f64, as_text, is_null, number_cell, Table};

pub const LEGACY_PERIOD: &str = "PERIOD";
pub const QUARTER: &str = "QUARTER";
pub const SHOT_TYPE: &str = "SHOT_TYPE";
pub const SHOT_TYPE_STD: &str = "SHOT_TYPE_STD";
pub const LOC_X: &str = "LOC_X";
pub const LOC_Y: &str = "LOC_Y";
pub const SHOT_DISTANCE: &str = "SHOT_DISTANCE";
pub const EXTRACTION_SEASON: &str = "api_extraction_season";
pub const EXTRACTION_SEASON_TYPE: &str = "api_extraction_season_type";
pub const SEASON: &str = "SEASON";
pub const IS_POSTSEASON: &str = "IS_POSTSEASON";
pub const GAME_DATE: &str = "GAME_DATE";
pub const GAME_YEAR: &str = "GAME_YEAR";
pub const SHOT_MADE_FLAG: &str = "SHOT_MADE_FLAG";
pub const SHOT_MADE: &str = "SHOT_MADE";
pub const SHOT_MISSED: &str = "SHOT_MISSED";
pub const DISTANCE_CLASS: &str = "DISTANCE_CLASS";

/// Columns of the cleaned table, in output order.
pub const FINAL_COLUMNS: &[&str] = &[
    "GAME_ID",
    GAME_DATE,
    GAME_YEAR,
    SEASON,
    IS_POSTSEASON,
    "POSTSEASON_ROUND",
    "TEAM_ID",
    "OPPONENT_TEAM_ID",
    "HOME_AWAY",
    SHOT_TYPE_STD,
    SHOT_MADE,
    SHOT_MISSED,
    LOC_X,
    LOC_Y,
    SHOT_DISTANCE,
    DISTANCE_CLASS,
    QUARTER,
    "MINUTES_REMAINING",
    "SECONDS_REMAINING",
    "SHOT_ZONE_BASIC",
    "SHOT_ZONE_AREA",
    "ACTION_TYPE",
];

/// A stage's new table plus its report fragment.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub table: Table,
    pub step: StepSummary,
    pub warnings: Vec<String>,
}

impl StageOutput {
    fn new(table: Table, step: StepSummary) -> Self {
        Self { table, step, warnings: Vec::new() }
    }

    fn warn_if(mut self, condition: bool, warning: impl FnOnce() -> String) -> Self {
        if condition {
            self.warnings.push(warning());
        }
        self
    }
}

/// Stage 1: rename the legacy `PERIOD` column and inventory missing values.
pub fn normalize_columns(table: Table) -> StageOutput {
    let table = if table.has_column(QUARTER) {
        table
    } else {
        table.rename_column(LEGACY_PERIOD, QUARTER)
    };

    let missing_values: BTreeMap<String, usize> = table
        .columns()
        .iter()
        .map(|c| (c.clone(), table.null_count(c)))
        .filter(|(_, nulls)| *nulls > 0)
        .collect();

    for (column, nulls) in &missing_values {
        let pct = *nulls as f64 * 100.0 / table.len().max(1) as f64;
        log_info_indent(format!("{}: {} ({:.1}%)", column, nulls, pct), 1);
    }

    let rows = table.len();
    StageOutput::new(table, StepSummary::LoadData { rows, missing_values })
}

/// Stage 2: map raw shot-type labels to standard codes.
///
/// Reads `SHOT_TYPE`, or `SHOT_TYPE_STD` itself when the raw column is gone,
/// so running it over cleaned data changes nothing.
pub fn standardize_shot_types(table: Table, config: &TransformConfig) -> StageOutput {
    let source = if table.has_column(SHOT_TYPE) { SHOT_TYPE } else { SHOT_TYPE_STD };

    let table = table.with_column(SHOT_TYPE_STD, |row| {
        as_text(row.get(source))
            .and_then(|label| config.standardize(&label))
            .map_or(Value::Null, |code| Value::String(code.code().to_string()))
    });

    let unmapped: Vec<String> = table
        .rows()
        .iter()
        .filter(|row| is_null(row.get(SHOT_TYPE_STD)))
        .filter_map(|row| as_text(row.get(source)))
        .fold(Vec::new(), |mut seen, label| {
            if !seen.contains(&label) {
                seen.push(label);
            }
            seen
        });

    let unique_types = table.distinct_text(SHOT_TYPE_STD).len();
    let warning = format!("Unmapped shot types: {:?}", unmapped);

    StageOutput::new(table, StepSummary::StandardizeShotTypes { unique_types, unmapped: unmapped.clone() })
        .warn_if(!unmapped.is_empty(), || warning)
}

/// Stage 3: drop rows with a null coordinate, then coerce both to numbers.
pub fn clean_coordinates(table: Table) -> StageOutput {
    if !table.has_column(LOC_X) || !table.has_column(LOC_Y) {
        let rows_remaining = table.len();
        return StageOutput::new(table, StepSummary::CleanCoordinates { rows_dropped: 0, rows_remaining });
    }

    let before = table.len();
    let table = table
        .filter(|row| !is_null(row.get(LOC_X)) && !is_null(row.get(LOC_Y)))
        .with_column(LOC_X, |row| number_cell(as_f64(row.get(LOC_X))))
        .with_column(LOC_Y, |row| number_cell(as_f64(row.get(LOC_Y))));

    let rows_dropped = before - table.len();
    let rows_remaining = table.len();

    StageOutput::new(table, StepSummary::CleanCoordinates { rows_dropped, rows_remaining })
        .warn_if(rows_dropped > 0, || format!("{} shots with null coordinates", rows_dropped))
}

/// Stage 4: flag distances outside the valid range. Rows are kept.
pub fn validate_distance(table: Table, range: &DistanceRange) -> StageOutput {
    let table = if table.has_column(SHOT_DISTANCE) {
        table.with_column(SHOT_DISTANCE, |row| number_cell(as_f64(row.get(SHOT_DISTANCE))))
    } else {
        table
    };

    let distances: Vec<f64> = table
        .rows()
        .iter()
        .filter_map(|row| as_f64(row.get(SHOT_DISTANCE)))
        .collect();

    let out_of_range = distances.iter().filter(|d| !range.contains(**d)).count();
    let avg_distance = if distances.is_empty() {
        None
    } else {
        Some(distances.iter().sum::<f64>() / distances.len() as f64)
    };

    StageOutput::new(table, StepSummary::ValidateShotDistance { out_of_range, avg_distance })
        .warn_if(out_of_range > 0, || {
            format!(
                "{} shots outside valid distance range [{}, {}]",
                out_of_range, range.min, range.max
            )
        })
}

/// Parse the API's `YYYYMMDD` as well as ISO dates and datetimes.
pub fn parse_game_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let year = text[..4].parse().ok()?;
        let month = text[4..6].parse().ok()?;
        let day = text[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok().map(|dt| dt.date()))
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").ok().map(|dt| dt.date()))
}

/// Stage 5: season metadata, typed date, made/missed pair and distance class.
///
/// When the extraction metadata or raw flag columns are absent the already
/// derived column is reused.
pub fn derive_columns(table: Table, config: &TransformConfig) -> StageOutput {
    let bad_dates = table
        .rows()
        .iter()
        .filter(|row| as_text(row.get(GAME_DATE)).is_some_and(|d| parse_game_date(&d).is_none()))
        .count();
    let made_source = if table.has_column(SHOT_MADE_FLAG) { SHOT_MADE_FLAG } else { SHOT_MADE };
    let bad_flags = table
        .rows()
        .iter()
        .filter(|row| !is_null(row.get(made_source)) && as_bool(row.get(made_source)).is_none())
        .count();

    let table = table
        .with_column(SEASON, |row| {
            row.get(EXTRACTION_SEASON)
                .filter(|v| !v.is_null())
                .or_else(|| row.get(SEASON))
                .cloned()
                .unwrap_or(Value::Null)
        })
        .with_column(IS_POSTSEASON, |row| match as_text(row.get(EXTRACTION_SEASON_TYPE)) {
            Some(season_type) => Value::Bool(season_type == config.postseason_label),
            None => Value::Bool(as_bool(row.get(IS_POSTSEASON)).unwrap_or(false)),
        })
        .with_column(GAME_DATE, |row| {
            as_text(row.get(GAME_DATE))
                .and_then(|d| parse_game_date(&d))
                .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string()))
        })
        .with_column(GAME_YEAR, |row| {
            as_text(row.get(GAME_DATE))
                .and_then(|d| parse_game_date(&d))
                .map_or(Value::Null, |d| Value::from(d.year()))
        })
        .with_column(SHOT_MADE, |row| {
            as_bool(row.get(made_source)).map_or(Value::Null, |made| Value::from(i64::from(made)))
        })
        .with_column(SHOT_MISSED, |row| {
            as_bool(row.get(SHOT_MADE)).map_or(Value::Null, |made| Value::from(1 - i64::from(made)))
        })
        .with_column(DISTANCE_CLASS, |row| {
            as_f64(row.get(SHOT_DISTANCE))
                .and_then(|d| config.classify_distance(d))
                .map_or(Value::Null, |label| Value::String(label.to_string()))
        });

    let new_columns = [SEASON, IS_POSTSEASON, GAME_DATE, GAME_YEAR, SHOT_MADE, SHOT_MISSED, DISTANCE_CLASS]
        .into_iter()
        .map(String::from)
        .collect();

    StageOutput::new(table, StepSummary::AddDerivedColumns { new_columns })
        .warn_if(bad_dates > 0, || format!("{} rows with unparseable {}", bad_dates, GAME_DATE))
        .warn_if(bad_flags > 0, || format!("{} rows with invalid {}", bad_flags, made_source))
}

/// Stage 6: fail when a required column is absent; otherwise warn about nulls.
pub fn validate_required_columns(
    table: Table,
    required: &[String],
) -> Result<StageOutput, TransformError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !table.has_column(c))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(TransformError::MissingColumns(missing));
    }

    let nulls: Vec<(&str, usize)> = required
        .iter()
        .map(|c| (c.as_str(), table.null_count(c)))
        .filter(|(_, n)| *n > 0)
        .collect();
    let null_count: usize = nulls.iter().map(|(_, n)| n).sum();
    let detail = nulls
        .iter()
        .map(|(c, n)| format!("{} ({})", c, n))
        .collect::<Vec<_>>()
        .join(", ");

    let final_rows = table.len();
    Ok(StageOutput::new(table, StepSummary::ValidateDataQuality { final_rows, null_count })
        .warn_if(null_count > 0, || {
            format!("{} null values in critical columns: {}", null_count, detail)
        }))
}

/// Stage 7: restrict the table to [`FINAL_COLUMNS`].
pub fn select_final_columns(table: Table) -> StageOutput {
    let table = table.project(FINAL_COLUMNS);
    let columns = table.columns().to_vec();
    StageOutput::new(table, StepSummary::SelectFinalColumns { columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use serde_json::json;

    fn table(rows: Vec<Value>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.as_object().into_iter().flat_map(|o| o.keys()) {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows: Vec<Row> = rows.into_iter().filter_map(|r| r.as_object().cloned()).collect();
        Table::from_rows(columns, rows)
    }

    #[test]
    fn test_period_renamed_to_quarter() {
        let out = normalize_columns(table(vec![json!({ "PERIOD": "1", "LOC_X": null })]));
        assert!(out.table.has_column(QUARTER));
        assert!(!out.table.has_column(LEGACY_PERIOD));
        match out.step {
            StepSummary::LoadData { rows, missing_values } => {
                assert_eq!(rows, 1);
                assert_eq!(missing_values.get("LOC_X"), Some(&1));
                assert!(!missing_values.contains_key(QUARTER));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_existing_quarter_kept() {
        let out = normalize_columns(table(vec![json!({ "PERIOD": "1", "QUARTER": "2" })]));
        assert_eq!(out.table.rows()[0][QUARTER], "2");
        assert!(out.table.has_column(LEGACY_PERIOD));
    }

    #[test]
    fn test_unmapped_labels_listed_once() {
        let config = TransformConfig::default();
        let out = standardize_shot_types(
            table(vec![
                json!({ "SHOT_TYPE": "2PT Field Goal" }),
                json!({ "SHOT_TYPE": "Heave" }),
                json!({ "SHOT_TYPE": "Heave" }),
            ]),
            &config,
        );
        assert_eq!(out.table.rows()[0][SHOT_TYPE_STD], "2PT");
        assert_eq!(out.table.rows()[1][SHOT_TYPE_STD], Value::Null);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("Heave"));
        assert_eq!(
            out.step,
            StepSummary::StandardizeShotTypes { unique_types: 1, unmapped: vec!["Heave".into()] }
        );
    }

    #[test]
    fn test_standardization_idempotent_on_cleaned_data() {
        let config = TransformConfig::default();
        let cleaned = table(vec![
            json!({ "SHOT_TYPE_STD": "3PT" }),
            json!({ "SHOT_TYPE_STD": null }),
        ]);
        let out = standardize_shot_types(cleaned.clone(), &config);
        assert_eq!(out.table, cleaned);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_null_coordinates_dropped_and_coerced() {
        let out = clean_coordinates(table(vec![
            json!({ "LOC_X": "10", "LOC_Y": null }),
            json!({ "LOC_X": null, "LOC_Y": "4" }),
            json!({ "LOC_X": "-3", "LOC_Y": "abc" }),
        ]));
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.table.rows()[0][LOC_X], json!(-3.0));
        assert_eq!(out.table.rows()[0][LOC_Y], Value::Null);
        assert_eq!(out.warnings, vec!["2 shots with null coordinates".to_string()]);
    }

    #[test]
    fn test_clean_coordinates_without_nulls_has_no_warning() {
        let out = clean_coordinates(table(vec![json!({ "LOC_X": "1", "LOC_Y": "2" })]));
        assert!(out.warnings.is_empty());
        assert_eq!(out.step, StepSummary::CleanCoordinates { rows_dropped: 0, rows_remaining: 1 });
    }

    #[test]
    fn test_out_of_range_distances_flagged_not_dropped() {
        let range = DistanceRange { min: 0.0, max: 80.0 };
        let out = validate_distance(
            table(vec![
                json!({ "SHOT_DISTANCE": "5" }),
                json!({ "SHOT_DISTANCE": "90" }),
                json!({ "SHOT_DISTANCE": "-1" }),
            ]),
            &range,
        );
        assert_eq!(out.table.len(), 3);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("2 shots outside valid distance range"));
        match out.step {
            StepSummary::ValidateShotDistance { out_of_range, avg_distance } => {
                assert_eq!(out_of_range, 2);
                assert_eq!(avg_distance, Some(94.0 / 3.0));
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_parse_game_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2003, 10, 29);
        assert_eq!(parse_game_date("20031029"), expected);
        assert_eq!(parse_game_date("2003-10-29"), expected);
        assert_eq!(parse_game_date("2003-10-29 00:00:00"), expected);
        assert_eq!(parse_game_date("20031329"), None);
        assert_eq!(parse_game_date("yesterday"), None);
    }

    #[test]
    fn test_derived_columns() {
        let config = TransformConfig::default();
        let out = derive_columns(
            table(vec![
                json!({
                    "api_extraction_season": "2003", "api_extraction_season_type": "Playoffs",
                    "GAME_DATE": "20040501", "SHOT_MADE_FLAG": "1", "SHOT_DISTANCE": 3.0
                }),
                json!({
                    "api_extraction_season": "2003", "api_extraction_season_type": "Regular Season",
                    "GAME_DATE": "bad", "SHOT_MADE_FLAG": "0", "SHOT_DISTANCE": 3.01
                }),
            ]),
            &config,
        );

        let first = &out.table.rows()[0];
        assert_eq!(first[SEASON], "2003");
        assert_eq!(first[IS_POSTSEASON], true);
        assert_eq!(first[GAME_DATE], "2004-05-01");
        assert_eq!(first[GAME_YEAR], 2004);
        assert_eq!(first[SHOT_MADE], 1);
        assert_eq!(first[SHOT_MISSED], 0);
        assert_eq!(first[DISTANCE_CLASS], "At Rim");

        let second = &out.table.rows()[1];
        assert_eq!(second[IS_POSTSEASON], false);
        assert_eq!(second[GAME_DATE], Value::Null);
        assert_eq!(second[GAME_YEAR], Value::Null);
        assert_eq!(second[DISTANCE_CLASS], "Mid Range");

        assert_eq!(out.warnings, vec!["1 rows with unparseable GAME_DATE".to_string()]);
    }

    #[test]
    fn test_made_plus_missed_is_one() {
        let config = TransformConfig::default();
        let rows = ["0", "1", "1.0", "0.0", "true"]
            .iter()
            .map(|flag| json!({ "SHOT_MADE_FLAG": flag }))
            .collect();
        let out = derive_columns(table(rows), &config);
        for row in out.table.rows() {
            let made = row[SHOT_MADE].as_i64().unwrap();
            let missed = row[SHOT_MISSED].as_i64().unwrap();
            assert_eq!(made + missed, 1);
        }
    }

    #[test]
    fn test_unreadable_made_flag_leaves_outcome_null() {
        let config = TransformConfig::default();
        let rows = vec![json!({ "SHOT_MADE_FLAG": null }), json!({ "SHOT_MADE_FLAG": "maybe" })];
        let out = derive_columns(table(rows), &config);
        for row in out.table.rows() {
            assert_eq!(row[SHOT_MADE], Value::Null);
            assert_eq!(row[SHOT_MISSED], Value::Null);
        }
        assert_eq!(out.warnings, vec!["1 rows with invalid SHOT_MADE_FLAG".to_string()]);
    }

    #[test]
    fn test_derive_reuses_existing_columns() {
        let config = TransformConfig::default();
        let cleaned = table(vec![json!({
            "SEASON": "2010", "IS_POSTSEASON": "true", "GAME_DATE": "2011-06-01", "SHOT_MADE": "1"
        })]);
        let out = derive_columns(cleaned, &config);
        let row = &out.table.rows()[0];
        assert_eq!(row[SEASON], "2010");
        assert_eq!(row[IS_POSTSEASON], true);
        assert_eq!(row[SHOT_MADE], 1);
        assert_eq!(row[SHOT_MISSED], 0);
    }

    #[test]
    fn test_missing_required_column_fails() {
        let required = vec!["GAME_ID".to_string(), "PLAYER_ID".to_string()];
        let err = validate_required_columns(table(vec![json!({ "GAME_ID": "1" })]), &required)
            .unwrap_err();
        assert_eq!(err, TransformError::MissingColumns(vec!["PLAYER_ID".into()]));
    }

    #[test]
    fn test_required_nulls_only_warn() {
        let required = vec!["GAME_ID".to_string(), "PLAYER_ID".to_string()];
        let out = validate_required_columns(
            table(vec![
                json!({ "GAME_ID": "1", "PLAYER_ID": null }),
                json!({ "GAME_ID": null, "PLAYER_ID": null }),
            ]),
            &required,
        )
        .unwrap();
        assert_eq!(out.step, StepSummary::ValidateDataQuality { final_rows: 2, null_count: 3 });
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("PLAYER_ID (2)"));
    }

    #[test]
    fn test_final_projection() {
        let out = select_final_columns(table(vec![json!({
            "PLAYER_NAME": "LeBron James", "LOC_Y": 1.0, "GAME_ID": "1", "SHOT_TYPE": "2PT Field Goal"
        })]));
        assert_eq!(out.table.columns(), ["GAME_ID", "LOC_Y"]);
    }
}
