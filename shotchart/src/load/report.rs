//! Load report and step progression.
//!
//! A load walks `Loaded -> TeamsSeeded -> GamesResolved -> ShotsInserted ->
//! Verified`. The report names the last stage that committed, so a failed run
//! tells the operator exactly where it stopped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::store::TableCounts;
use crate::error::StoreError;
use crate::logs::{log_error, log_info, log_success, log_warning, log_warning_indent};

/// Where a load run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    Loaded,
    TeamsSeeded,
    GamesResolved,
    ShotsInserted,
    Verified,
}

impl LoadStage {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Loaded => Some(Self::TeamsSeeded),
            Self::TeamsSeeded => Some(Self::GamesResolved),
            Self::GamesResolved => Some(Self::ShotsInserted),
            Self::ShotsInserted => Some(Self::Verified),
            Self::Verified => None,
        }
    }

    /// The step that moves the run out of this stage.
    pub fn pending_step(self) -> Option<LoadStep> {
        match self {
            Self::Loaded => Some(LoadStep::SeedTeams),
            Self::TeamsSeeded => Some(LoadStep::ResolveGames),
            Self::GamesResolved => Some(LoadStep::InsertShots),
            Self::ShotsInserted => Some(LoadStep::Verify),
            Self::Verified => None,
        }
    }
}

/// The four store steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStep {
    SeedTeams,
    ResolveGames,
    InsertShots,
    Verify,
}

impl LoadStep {
    pub const ALL: [LoadStep; 4] = [Self::SeedTeams, Self::ResolveGames, Self::InsertShots, Self::Verify];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SeedTeams => "seed_teams",
            Self::ResolveGames => "resolve_games",
            Self::InsertShots => "insert_shots",
            Self::Verify => "verify",
        }
    }
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One expected-vs-actual row count comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountCheck {
    pub table: String,
    pub expected: i64,
    pub actual: i64,
}

impl CountCheck {
    pub fn new(table: &str, expected: i64, actual: i64) -> Self {
        Self { table: table.to_string(), expected, actual }
    }

    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub checks: Vec<CountCheck>,
    pub discrepancies: Vec<String>,
}

impl Verification {
    pub fn from_checks(checks: Vec<CountCheck>) -> Self {
        let discrepancies = checks
            .iter()
            .filter(|c| !c.passed())
            .map(|c| format!("{}: expected {}, found {}", c.table, c.expected, c.actual))
            .collect();
        Self { checks, discrepancies }
    }

    pub fn passed(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Metrics recorded by each step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LoadStepSummary {
    SeedTeams {
        directory_teams: usize,
        inserted: usize,
        teams_total: i64,
    },
    ResolveGames {
        distinct_games: usize,
        inserted: usize,
        /// Game ids with a team reference missing from the store.
        unresolved: Vec<String>,
        /// Game ids that are not integers.
        invalid_ids: Vec<String>,
        games_total: i64,
    },
    InsertShots {
        attempted: usize,
        inserted: usize,
        /// Shots whose game is not in the store.
        skipped: usize,
        shots_total: i64,
    },
    Verify(Verification),
}

impl LoadStepSummary {
    pub fn step(&self) -> LoadStep {
        match self {
            Self::SeedTeams { .. } => LoadStep::SeedTeams,
            Self::ResolveGames { .. } => LoadStep::ResolveGames,
            Self::InsertShots { .. } => LoadStep::InsertShots,
            Self::Verify(_) => LoadStep::Verify,
        }
    }

    /// Per-game error entries carried by this summary.
    fn errors(&self) -> Vec<String> {
        match self {
            Self::ResolveGames { unresolved, invalid_ids, .. } => unresolved
                .iter()
                .map(|id| format!("Missing team mapping for game {}", id))
                .chain(invalid_ids.iter().map(|id| format!("Invalid game id '{}'", id)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Rows in the cleaned input table.
    pub rows: usize,
    pub last_completed: LoadStage,
    pub steps: Vec<LoadStepSummary>,
    pub errors: Vec<String>,
    /// Store totals after the last committed step.
    pub stats: TableCounts,
    pub verification: Option<Verification>,
}

impl LoadReport {
    pub fn new(rows: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            rows,
            last_completed: LoadStage::Loaded,
            steps: Vec::new(),
            errors: Vec::new(),
            stats: TableCounts::default(),
            verification: None,
        }
    }

    /// Record a committed step and advance the stage.
    pub fn complete(&mut self, summary: LoadStepSummary, stats: TableCounts) {
        for error in summary.errors() {
            log_warning_indent(error.as_str(), 1);
            self.errors.push(error);
        }
        if let LoadStepSummary::Verify(verification) = &summary {
            self.verification = Some(verification.clone());
        }
        log_success(format!(
            "{} done (teams {}, games {}, shots {})",
            summary.step(),
            stats.teams,
            stats.games,
            stats.shots
        ));

        if let Some(next) = self.last_completed.next() {
            self.last_completed = next;
        }
        self.stats = stats;
        self.steps.push(summary);
    }

    /// Record the error that aborted `step`.
    pub fn fail(&mut self, step: LoadStep, error: &StoreError) {
        let message = format!("{}: {}", step, error);
        log_error(message.as_str());
        self.errors.push(message);
        self.finished_at = Some(Utc::now());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn log_summary(&self) {
        log_info(format!("Run {}", self.run_id));
        log_info(format!("Last completed stage: {:?}", self.last_completed));
        log_info(format!(
            "Teams: {}  Games: {}  Shots: {}",
            self.stats.teams, self.stats.games, self.stats.shots
        ));
        if let Some(verification) = &self.verification {
            if verification.passed() {
                log_success("Verification passed");
            } else {
                log_warning(format!("{} discrepancies", verification.discrepancies.len()));
                for discrepancy in &verification.discrepancies {
                    log_warning_indent(discrepancy.as_str(), 1);
                }
            }
        }
        if !self.errors.is_empty() {
            log_warning(format!("{} errors", self.errors.len()));
        }
    }
}
