//! Flat in-memory table of shot records.
//!
//! A [`Table`] is an ordered list of column names plus rows of JSON cells,
//! the same shape the parser produces. Operations consume the table and
//! return a new one so pipeline stages stay pure.
//!
//! Cells are loosely typed: the parser yields strings (or `Null` for empty
//! cells) and stages coerce them with [`as_f64`], [`as_i64`], [`as_bool`]
//! and [`as_text`]. A missing key and an explicit `Null` both count as null.

use serde_json::{Map, Value};

/// One record, keyed by column name.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Rename a column in the header and in every row. No-op if absent.
    pub fn rename_column(mut self, from: &str, to: &str) -> Self {
        if !self.has_column(from) {
            return self;
        }
        for column in self.columns.iter_mut().filter(|c| c.as_str() == from) {
            *column = to.to_string();
        }
        for row in &mut self.rows {
            if let Some(value) = row.remove(from) {
                row.insert(to.to_string(), value);
            }
        }
        self
    }

    /// Add (or replace) a column computed from each row.
    pub fn with_column<F>(mut self, name: &str, mut compute: F) -> Self
    where
        F: FnMut(&Row) -> Value,
    {
        for row in &mut self.rows {
            let value = compute(row);
            row.insert(name.to_string(), value);
        }
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        self
    }

    /// Keep rows matching the predicate.
    pub fn filter<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows.retain(|row| keep(row));
        self
    }

    /// Restrict the table to `wanted`, in that order. Absent columns are skipped.
    pub fn project(self, wanted: &[&str]) -> Self {
        let columns: Vec<String> = wanted
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| c.to_string())
            .collect();

        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|c| (c.clone(), row.remove(c).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of null cells in a column.
    pub fn null_count(&self, column: &str) -> usize {
        self.rows.iter().filter(|row| is_null(row.get(column))).count()
    }

    /// Distinct non-null text values of a column, in first-seen order.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if let Some(text) = as_text(row.get(column)) {
                if !seen.contains(&text) {
                    seen.push(text);
                }
            }
        }
        seen
    }
}

// =============================================================================
// Cell coercion
// =============================================================================

pub fn is_null(cell: Option<&Value>) -> bool {
    matches!(cell, None | Some(Value::Null))
}

/// Numeric value of a cell; non-numeric text and non-finite numbers are `None`.
pub fn as_f64(cell: Option<&Value>) -> Option<f64> {
    let value = match cell? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

/// Integer value of a cell. Whole floats such as `"3.0"` are accepted.
pub fn as_i64(cell: Option<&Value>) -> Option<i64> {
    match cell? {
        Value::Number(n) => n.as_i64().or_else(|| whole(n.as_f64()?)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| whole(s.parse::<f64>().ok()?))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn whole(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

/// Boolean value of a cell: `true/false`, `1/0` (and `1.0/0.0`), `yes/no`.
pub fn as_bool(cell: Option<&Value>) -> Option<bool> {
    match cell? {
        Value::Bool(b) => Some(*b),
        Value::Number(_) => match as_i64(cell)? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => match as_i64(cell)? {
                0 => Some(false),
                1 => Some(true),
                _ => None,
            },
        },
        _ => None,
    }
}

/// Text value of a cell; numbers and booleans are rendered, blanks are `None`.
pub fn as_text(cell: Option<&Value>) -> Option<String> {
    match cell? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Cell holding `value`, or `Null` for `None` / non-finite floats.
pub fn number_cell(value: Option<f64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let rows = vec![
            json!({ "A": "1", "PERIOD": "2" }),
            json!({ "A": null, "PERIOD": "4" }),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        Table::from_rows(vec!["A".into(), "PERIOD".into()], rows)
    }

    #[test]
    fn test_rename_column() {
        let table = sample().rename_column("PERIOD", "QUARTER");
        assert_eq!(table.columns(), ["A", "QUARTER"]);
        assert_eq!(table.rows()[1]["QUARTER"], "4");
        assert!(!table.rows()[1].contains_key("PERIOD"));
    }

    #[test]
    fn test_rename_missing_column_is_noop() {
        let table = sample().rename_column("NOPE", "X");
        assert_eq!(table, sample());
    }

    #[test]
    fn test_with_column_appends_header_once() {
        let table = sample()
            .with_column("B", |_| json!(1))
            .with_column("B", |_| json!(2));
        assert_eq!(table.columns(), ["A", "PERIOD", "B"]);
        assert_eq!(table.rows()[0]["B"], 2);
    }

    #[test]
    fn test_project_skips_absent_columns() {
        let table = sample().project(&["PERIOD", "MISSING", "A"]);
        assert_eq!(table.columns(), ["PERIOD", "A"]);
        assert_eq!(table.rows()[0].len(), 2);
    }

    #[test]
    fn test_null_count_and_filter() {
        let table = sample();
        assert_eq!(table.null_count("A"), 1);
        assert_eq!(table.null_count("NOT_THERE"), 2);
        let kept = table.filter(|row| !is_null(row.get("A")));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(as_f64(Some(&json!(" 3.5 "))), Some(3.5));
        assert_eq!(as_f64(Some(&json!("abc"))), None);
        assert_eq!(as_f64(Some(&json!("NaN"))), None);
        assert_eq!(as_i64(Some(&json!("3.0"))), Some(3));
        assert_eq!(as_i64(Some(&json!("3.5"))), None);
        assert_eq!(as_i64(Some(&json!(12))), Some(12));
        assert_eq!(as_i64(None), None);
    }

    #[test]
    fn test_bool_coercion() {
        assert_eq!(as_bool(Some(&json!("1.0"))), Some(true));
        assert_eq!(as_bool(Some(&json!("False"))), Some(false));
        assert_eq!(as_bool(Some(&json!(0))), Some(false));
        assert_eq!(as_bool(Some(&json!("2"))), None);
    }

    #[test]
    fn test_text_and_distinct() {
        assert_eq!(as_text(Some(&json!("  "))), None);
        assert_eq!(as_text(Some(&json!(7))), Some("7".to_string()));

        let table = sample().with_column("T", |row| {
            if is_null(row.get("A")) { json!("y") } else { json!("x") }
        });
        assert_eq!(table.distinct_text("T"), vec!["x", "y"]);
    }
}
