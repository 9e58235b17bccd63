//! Transform engine.
//!
//! - Config: business rules (shot-type mapping, distance buckets, thresholds)
//! - Stages: the seven pure cleaning steps
//! - Report: per-step metrics, warnings and errors
//! - Pipeline: runs the stages in order

pub mod config;
pub mod pipeline;
pub mod report;
pub mod stages;

pub use config::{DistanceBucket, DistanceRange, TransformConfig};
pub use pipeline::{transform, transform_csv, CsvInfo, TransformOutput};
pub use report::{StepSummary, TransformReport};
pub use stages::{StageOutput, FINAL_COLUMNS};
