//! Transform configuration.
//!
//! Every business rule of the cleaning pipeline lives here and is passed
//! explicitly into [`crate::transform::transform`]. The defaults reproduce
//! the rules used for the NBA shot-chart extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{SeasonType, ShotType};
use crate::validation::validate_transform_config;

/// Inclusive range of plausible shot distances, in feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRange {
    pub min: f64,
    pub max: f64,
}

impl DistanceRange {
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }
}

/// A distance class. `upper_bound: None` is unbounded and must come last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBucket {
    #[serde(default)]
    pub upper_bound: Option<f64>,
    pub label: String,
}

impl DistanceBucket {
    pub fn new(upper_bound: Option<f64>, label: impl Into<String>) -> Self {
        Self { upper_bound, label: label.into() }
    }

    fn accepts(&self, distance: f64) -> bool {
        self.upper_bound.map_or(true, |bound| distance <= bound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Raw API label -> standard code.
    pub shot_type_mapping: BTreeMap<String, ShotType>,
    pub valid_distance_range: DistanceRange,
    /// Columns that must exist after cleaning or the run fails.
    pub required_columns: Vec<String>,
    /// Ordered; the first bucket whose bound admits the distance wins.
    pub distance_buckets: Vec<DistanceBucket>,
    /// Extraction season type that marks a postseason shot.
    #[serde(default = "default_postseason_label")]
    pub postseason_label: String,
}

fn default_postseason_label() -> String {
    SeasonType::Playoffs.label().to_string()
}

impl Default for TransformConfig {
    fn default() -> Self {
        let shot_type_mapping = [
            ("2PT Field Goal", ShotType::TwoPoint),
            ("3PT Field Goal", ShotType::ThreePoint),
            ("Free Throw", ShotType::FreeThrow),
        ]
        .into_iter()
        .map(|(label, code)| (label.to_string(), code))
        .collect();

        let required_columns = [
            "GAME_ID",
            "GAME_DATE",
            "PLAYER_ID",
            "SHOT_TYPE",
            "SHOT_MADE_FLAG",
            "LOC_X",
            "LOC_Y",
            "SHOT_DISTANCE",
            "QUARTER",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            shot_type_mapping,
            valid_distance_range: DistanceRange { min: 0.0, max: 80.0 },
            required_columns,
            distance_buckets: vec![
                DistanceBucket::new(Some(3.0), "At Rim"),
                DistanceBucket::new(Some(10.0), "Mid Range"),
                DistanceBucket::new(Some(23.75), "Three Point"),
                DistanceBucket::new(None, "Beyond Arc"),
            ],
            postseason_label: default_postseason_label(),
        }
    }
}

impl TransformConfig {
    /// Parse a JSON config, checking it against the embedded schema first.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_transform_config(&value).map_err(|errors| ConfigError::Schema { errors })?;
        let config: Self = serde_json::from_value(value)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Semantic checks the schema cannot express.
    pub fn check(&self) -> ConfigResult<()> {
        let range = &self.valid_distance_range;
        if range.min > range.max {
            return Err(ConfigError::Invalid(format!(
                "valid_distance_range min ({}) exceeds max ({})",
                range.min, range.max
            )));
        }

        if self.distance_buckets.is_empty() {
            return Err(ConfigError::Invalid("distance_buckets must not be empty".into()));
        }

        let last = self.distance_buckets.len() - 1;
        let mut previous: Option<f64> = None;
        for (i, bucket) in self.distance_buckets.iter().enumerate() {
            match bucket.upper_bound {
                None if i != last => {
                    return Err(ConfigError::Invalid(format!(
                        "unbounded distance bucket '{}' must be the last one",
                        bucket.label
                    )));
                }
                Some(bound) if previous.is_some_and(|p| bound <= p) => {
                    return Err(ConfigError::Invalid(format!(
                        "distance bucket '{}' upper bound {} is not ascending",
                        bucket.label, bound
                    )));
                }
                _ => previous = bucket.upper_bound.or(previous),
            }
        }

        Ok(())
    }

    /// Standard code for a label. Labels that already are standard codes map
    /// to themselves, which keeps re-standardization a no-op.
    pub fn standardize(&self, label: &str) -> Option<ShotType> {
        self.shot_type_mapping
            .get(label)
            .copied()
            .or_else(|| ShotType::from_code(label))
    }

    /// Distance class label. Falls back to the last bucket when no bound admits
    /// the distance.
    pub fn classify_distance(&self, distance: f64) -> Option<&str> {
        self.distance_buckets
            .iter()
            .find(|bucket| bucket.accepts(distance))
            .or_else(|| self.distance_buckets.last())
            .map(|bucket| bucket.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_shot_chart_rules() {
        let config = TransformConfig::default();
        assert_eq!(config.shot_type_mapping.len(), 3);
        assert_eq!(config.valid_distance_range, DistanceRange { min: 0.0, max: 80.0 });
        assert_eq!(config.required_columns.len(), 9);
        assert_eq!(config.postseason_label, "Playoffs");
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_distance_bucket_boundaries() {
        let config = TransformConfig::default();
        assert_eq!(config.classify_distance(0.0), Some("At Rim"));
        assert_eq!(config.classify_distance(3.0), Some("At Rim"));
        assert_eq!(config.classify_distance(3.01), Some("Mid Range"));
        assert_eq!(config.classify_distance(10.0), Some("Mid Range"));
        assert_eq!(config.classify_distance(23.75), Some("Three Point"));
        assert_eq!(config.classify_distance(23.76), Some("Beyond Arc"));
        assert_eq!(config.classify_distance(90.0), Some("Beyond Arc"));
    }

    #[test]
    fn test_classification_is_total_over_non_null_distances() {
        let config = TransformConfig::default();
        let labels: Vec<&str> = config.distance_buckets.iter().map(|b| b.label.as_str()).collect();
        for tenth in -20..1000 {
            let distance = tenth as f64 / 10.0;
            let class = config.classify_distance(distance).unwrap();
            assert_eq!(labels.iter().filter(|l| **l == class).count(), 1);
        }
    }

    #[test]
    fn test_fallback_to_highest_bucket_when_all_bounded() {
        let config = TransformConfig {
            distance_buckets: vec![
                DistanceBucket::new(Some(3.0), "Close"),
                DistanceBucket::new(Some(20.0), "Far"),
            ],
            ..TransformConfig::default()
        };
        assert_eq!(config.classify_distance(45.0), Some("Far"));
    }

    #[test]
    fn test_standardize_is_idempotent() {
        let config = TransformConfig::default();
        assert_eq!(config.standardize("2PT Field Goal"), Some(ShotType::TwoPoint));
        assert_eq!(config.standardize("2PT"), Some(ShotType::TwoPoint));
        assert_eq!(config.standardize("Heave"), None);
    }

    #[test]
    fn test_check_rejects_inverted_range() {
        let config = TransformConfig {
            valid_distance_range: DistanceRange { min: 10.0, max: 1.0 },
            ..TransformConfig::default()
        };
        assert!(matches!(config.check(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_check_rejects_misplaced_unbounded_bucket() {
        let config = TransformConfig {
            distance_buckets: vec![
                DistanceBucket::new(None, "Anything"),
                DistanceBucket::new(Some(3.0), "Close"),
            ],
            ..TransformConfig::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_check_rejects_unordered_buckets() {
        let config = TransformConfig {
            distance_buckets: vec![
                DistanceBucket::new(Some(10.0), "Mid"),
                DistanceBucket::new(Some(3.0), "Close"),
            ],
            ..TransformConfig::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_json_round_trip_through_schema() {
        let json = serde_json::to_string(&TransformConfig::default()).unwrap();
        let parsed = TransformConfig::from_json(&json).unwrap();
        assert_eq!(parsed, TransformConfig::default());
    }

    #[test]
    fn test_from_json_defaults_postseason_label() {
        let json = r#"{
            "shot_type_mapping": { "Free Throw": "FT" },
            "valid_distance_range": { "min": 0, "max": 50 },
            "required_columns": ["GAME_ID"],
            "distance_buckets": [{ "upper_bound": 5, "label": "Close" }, { "label": "Far" }]
        }"#;
        let config = TransformConfig::from_json(json).unwrap();
        assert_eq!(config.postseason_label, "Playoffs");
        assert_eq!(config.classify_distance(7.0), Some("Far"));
    }

    #[test]
    fn test_from_json_reports_schema_errors() {
        let err = TransformConfig::from_json(r#"{ "shot_type_mapping": {} }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Schema { .. }));
    }
}
