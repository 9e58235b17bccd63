//! Domain models for the shot-chart pipeline.
//!
//! - [`ShotType`] - standardized field-goal type code
//! - [`SeasonType`] - competition phase an extraction belongs to
//! - [`TeamRow`], [`GameRow`], [`ShotRow`] - rows of the relational schema

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Shot Type
// =============================================================================

/// Standardized shot type. Serialized as the short code (`2PT`, `3PT`, `FT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotType {
    #[serde(rename = "2PT")]
    TwoPoint,
    #[serde(rename = "3PT")]
    ThreePoint,
    #[serde(rename = "FT")]
    FreeThrow,
}

impl ShotType {
    pub const ALL: [ShotType; 3] = [Self::TwoPoint, Self::ThreePoint, Self::FreeThrow];

    /// Parse a standard code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "2PT" => Some(Self::TwoPoint),
            "3PT" => Some(Self::ThreePoint),
            "FT" => Some(Self::FreeThrow),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::TwoPoint => "2PT",
            Self::ThreePoint => "3PT",
            Self::FreeThrow => "FT",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Season Type
// =============================================================================

/// Competition phase, as labelled by the stats API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonType {
    #[serde(rename = "Regular Season")]
    Regular,
    #[serde(rename = "Playoffs")]
    Playoffs,
}

impl SeasonType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Regular => "Regular Season",
            Self::Playoffs => "Playoffs",
        }
    }
}

// =============================================================================
// Relational rows
// =============================================================================

/// Internal key assigned to a team by the store.
pub type TeamKey = i64;

/// A `teams` row as seeded from the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRow {
    pub external_team_id: i64,
    pub abbreviation: String,
    pub name: String,
}

/// A `games` row with both team references resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub game_id: i64,
    pub game_date: Option<NaiveDate>,
    pub season: Option<String>,
    pub is_postseason: bool,
    pub postseason_round: Option<String>,
    pub team_key: TeamKey,
    pub opponent_team_key: TeamKey,
    pub is_home: bool,
}

/// A `shots` row. Numeric fields that failed conversion are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRow {
    pub game_id: i64,
    pub shot_number: i64,
    pub shot_type: Option<String>,
    pub shot_made: Option<bool>,
    pub shot_x: Option<f64>,
    pub shot_y: Option<f64>,
    pub shot_distance: Option<f64>,
    pub quarter: Option<i64>,
    pub time_remaining_display: Option<String>,
    pub seconds_remaining_total: Option<i64>,
    pub season: Option<String>,
    pub is_postseason: bool,
    pub shot_zone_basic: Option<String>,
    pub shot_zone_area: Option<String>,
    pub action_type: Option<String>,
    pub distance_class: Option<String>,
    pub minutes_remaining: Option<i64>,
    pub seconds_remaining: Option<i64>,
}

/// `"MM:SS"` clock display and total seconds left in the period.
pub fn clock(minutes: Option<i64>, seconds: Option<i64>) -> (Option<String>, Option<i64>) {
    match (minutes, seconds) {
        (Some(m), Some(s)) => (Some(format!("{:02}:{:02}", m, s)), Some(m * 60 + s)),
        _ => (None, None),
    }
}
