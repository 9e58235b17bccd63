//! JSON Schema validation for user supplied configuration files.
//!
//! Schemas are embedded at compile time from the `schemas/` directory:
//! - `transform-config.json` - shot-type mapping, thresholds, distance buckets
//! - `team-directory.json` - external team id -> abbreviation/name entries
//!
//! Validation runs on the raw JSON before deserialization, so a bad file is
//! reported with every schema violation instead of serde's first error.

use once_cell::sync::Lazy;
use serde_json::Value;

static TRANSFORM_CONFIG_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/transform-config.json"))
        .expect("Invalid embedded transform config schema")
});

static TEAM_DIRECTORY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/team-directory.json"))
        .expect("Invalid embedded team directory schema")
});

/// Validate a JSON document against a schema.
///
/// Returns every violation as a message.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_transform_config(data: &Value) -> Result<(), Vec<String>> {
    validate(&TRANSFORM_CONFIG_SCHEMA, data)
}

pub fn validate_team_directory(data: &Value) -> Result<(), Vec<String>> {
    validate(&TEAM_DIRECTORY_SCHEMA, data)
}
