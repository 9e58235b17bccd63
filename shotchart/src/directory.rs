//! Team directory: external team id -> canonical abbreviation and name.
//!
//! [`TeamDirectory::nba()`] carries every franchise id the stats API has
//! used, historical ones included (Seattle, New Jersey, the New Orleans
//! Hornets). Other directories can be loaded from JSON:
//!
//! ```json
//! [{ "external_team_id": 1610612739, "abbreviation": "CLE", "name": "Cleveland Cavaliers" }]
//! ```

use serde_json::Value;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::TeamRow;
use crate::validation::validate_team_directory;

const NBA_TEAMS: &[(i64, &str, &str)] = &[
    (1610612737, "ATL", "Atlanta Hawks"),
    (1610612738, "BOS", "Boston Celtics"),
    (1610612739, "CLE", "Cleveland Cavaliers"),
    (1610612740, "NOP", "New Orleans Pelicans"),
    (1610612741, "CHI", "Chicago Bulls"),
    (1610612742, "DAL", "Dallas Mavericks"),
    (1610612743, "DEN", "Denver Nuggets"),
    (1610612744, "GSW", "Golden State Warriors"),
    (1610612745, "HOU", "Houston Rockets"),
    (1610612746, "LAC", "LA Clippers"),
    (1610612747, "LAL", "Los Angeles Lakers"),
    (1610612748, "MIA", "Miami Heat"),
    (1610612749, "MIL", "Milwaukee Bucks"),
    (1610612750, "NJN", "New Jersey Nets"),
    (1610612751, "MIN", "Minnesota Timberwolves"),
    (1610612752, "BKN", "Brooklyn Nets"),
    (1610612753, "NYK", "New York Knicks"),
    (1610612754, "ORL", "Orlando Magic"),
    (1610612755, "PHI", "Philadelphia 76ers"),
    (1610612756, "PHX", "Phoenix Suns"),
    (1610612757, "POR", "Portland Trail Blazers"),
    (1610612758, "SAC", "Sacramento Kings"),
    (1610612759, "SAS", "San Antonio Spurs"),
    (1610612760, "SEA", "Seattle SuperSonics"),
    (1610612761, "TOR", "Toronto Raptors"),
    (1610612762, "UTA", "Utah Jazz"),
    (1610612763, "MEM", "Memphis Grizzlies"),
    (1610612764, "WAS", "Washington Wizards"),
    (1610612765, "DET", "Detroit Pistons"),
    (1610612766, "CHA", "Charlotte Hornets"),
    (1610612767, "OKC", "Oklahoma City Thunder"),
    (1610617041, "IND", "Indiana Pacers"),
    (1610610025, "NOH", "New Orleans Hornets"),
    (1610610039, "NOK", "New Orleans/Oklahoma City Hornets"),
];

/// Static reference data seeded into the `teams` table.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDirectory {
    teams: Vec<TeamRow>,
}

impl TeamDirectory {
    /// Build a directory. Later entries with an already-seen id are dropped.
    pub fn new(teams: Vec<TeamRow>) -> Self {
        let mut unique: Vec<TeamRow> = Vec::with_capacity(teams.len());
        for team in teams {
            if !unique.iter().any(|t| t.external_team_id == team.external_team_id) {
                unique.push(team);
            }
        }
        Self { teams: unique }
    }

    /// The built-in NBA directory.
    pub fn nba() -> Self {
        Self::new(
            NBA_TEAMS
                .iter()
                .map(|(id, abbreviation, name)| TeamRow {
                    external_team_id: *id,
                    abbreviation: abbreviation.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        )
    }

    /// Parse a JSON directory after checking it against the embedded schema.
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        validate_team_directory(&value).map_err(|errors| ConfigError::Schema { errors })?;
        let teams: Vec<TeamRow> = serde_json::from_value(value)?;
        Ok(Self::new(teams))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn teams(&self) -> &[TeamRow] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, external_team_id: i64) -> Option<&TeamRow> {
        self.teams.iter().find(|t| t.external_team_id == external_team_id)
    }

    pub fn name_of(&self, external_team_id: i64) -> &str {
        self.get(external_team_id).map_or("Unknown Team", |t| t.name.as_str())
    }

    pub fn abbreviation_of(&self, external_team_id: i64) -> &str {
        self.get(external_team_id).map_or("UNK", |t| t.abbreviation.as_str())
    }
}

impl Default for TeamDirectory {
    fn default() -> Self {
        Self::nba()
    }
}
