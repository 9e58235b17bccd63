//! Relational loader.
//!
//! Normalizes the cleaned shot table into teams, games and shots. Each of the
//! four steps runs in its own connection and transaction: a failing step rolls
//! back and ends the run, while earlier steps stay committed.

use std::collections::{BTreeMap, HashSet};

use super::report::{CountCheck, LoadReport, LoadStep, LoadStepSummary, Verification};
use super::store::{game_ids, insert_game, insert_shots, insert_team, team_keys, SqliteStore, TableCounts};
use crate::directory::TeamDirectory;
use crate::error::{LoadFailure, StoreResult};
use crate::logs::{log_info, log_success};
use crate::models::{clock, GameRow, ShotRow};
use crate::table::{as_bool, as_f64, as_i64, as_text, Row, Table};
use crate::transform::stages::parse_game_date;

const DEFAULT_POSTSEASON_ROUNDS: &[(&str, &str)] = &[
    ("Play-In Tournament", "Play-In"),
    ("First Round", "R1"),
    ("Conference Semifinals", "R2"),
    ("Conference Finals", "R3"),
    ("Finals", "R4"),
];

pub struct Loader<'a> {
    directory: &'a TeamDirectory,
    store: &'a SqliteStore,
    postseason_rounds: BTreeMap<String, String>,
}

impl<'a> Loader<'a> {
    pub fn new(directory: &'a TeamDirectory, store: &'a SqliteStore) -> Self {
        let postseason_rounds = DEFAULT_POSTSEASON_ROUNDS
            .iter()
            .map(|(label, code)| (label.to_string(), code.to_string()))
            .collect();
        Self { directory, store, postseason_rounds }
    }

    /// Replace the postseason round label -> short code mapping.
    pub fn with_postseason_rounds(mut self, rounds: BTreeMap<String, String>) -> Self {
        self.postseason_rounds = rounds;
        self
    }

    /// Run the four steps in order.
    ///
    /// Referential problems are recorded in the report and the run continues.
    /// A store error aborts the run; the failure carries the report of the
    /// steps that committed.
    pub fn load(&self, cleaned: &Table) -> Result<LoadReport, LoadFailure> {
        log_info(format!("Loading {} shots into {}", cleaned.len(), self.store.path().display()));
        let mut report = LoadReport::new(cleaned.len());

        for step in LoadStep::ALL {
            log_info(format!("[{}] running", step));
            let outcome = match step {
                LoadStep::SeedTeams => self.seed_teams(),
                LoadStep::ResolveGames => self.resolve_games(cleaned),
                LoadStep::InsertShots => self.insert_shots(cleaned),
                LoadStep::Verify => self.verify(cleaned),
            };

            match outcome {
                Ok((summary, stats)) => report.complete(summary, stats),
                Err(error) => {
                    report.fail(step, &error);
                    return Err(LoadFailure { step, error, report });
                }
            }
        }

        report.finish();
        log_success(format!("Load {} complete", report.run_id));
        Ok(report)
    }

    fn seed_teams(&self) -> StoreResult<(LoadStepSummary, TableCounts)> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        for team in self.directory.teams() {
            inserted += insert_team(&tx, team)?;
        }
        let stats = TableCounts::query(&tx)?;
        tx.commit()?;

        let summary = LoadStepSummary::SeedTeams {
            directory_teams: self.directory.len(),
            inserted,
            teams_total: stats.teams,
        };
        Ok((summary, stats))
    }

    fn resolve_games(&self, cleaned: &Table) -> StoreResult<(LoadStepSummary, TableCounts)> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;
        let keys = team_keys(&tx)?;

        let mut seen = HashSet::new();
        let mut seen_invalid = HashSet::new();
        let mut inserted = 0;
        let mut unresolved = Vec::new();
        let mut invalid_ids = Vec::new();

        // Games are keyed by the integer id, so "0020300014" and "20300014" are one game.
        for row in cleaned.rows() {
            let Some(raw_id) = as_text(row.get("GAME_ID")) else { continue };
            let Some(game_id) = as_i64(row.get("GAME_ID")) else {
                if seen_invalid.insert(raw_id.clone()) {
                    invalid_ids.push(raw_id);
                }
                continue;
            };
            if !seen.insert(game_id) {
                continue;
            }

            let team_key = as_i64(row.get("TEAM_ID")).and_then(|id| keys.get(&id).copied());
            let opponent_key =
                as_i64(row.get("OPPONENT_TEAM_ID")).and_then(|id| keys.get(&id).copied());
            let (Some(team_key), Some(opponent_team_key)) = (team_key, opponent_key) else {
                unresolved.push(game_id.to_string());
                continue;
            };

            let game = GameRow {
                game_id,
                game_date: as_text(row.get("GAME_DATE")).and_then(|d| parse_game_date(&d)),
                season: as_text(row.get("SEASON")),
                is_postseason: as_bool(row.get("IS_POSTSEASON")).unwrap_or(false),
                postseason_round: self.postseason_round(row),
                team_key,
                opponent_team_key,
                is_home: as_text(row.get("HOME_AWAY")).is_some_and(|side| side == "HOME"),
            };
            inserted += insert_game(&tx, &game)?;
        }

        let stats = TableCounts::query(&tx)?;
        tx.commit()?;

        let summary = LoadStepSummary::ResolveGames {
            distinct_games: seen.len() + seen_invalid.len(),
            inserted,
            unresolved,
            invalid_ids,
            games_total: stats.games,
        };
        Ok((summary, stats))
    }

    fn postseason_round(&self, row: &Row) -> Option<String> {
        let label = as_text(row.get("POSTSEASON_ROUND"))?;
        Some(self.postseason_rounds.get(&label).cloned().unwrap_or(label))
    }

    fn insert_shots(&self, cleaned: &Table) -> StoreResult<(LoadStepSummary, TableCounts)> {
        let mut conn = self.store.connect()?;
        let tx = conn.transaction()?;
        let games = game_ids(&tx)?;

        // Numbering follows the cleaned table's row order, skipped rows included.
        let shots: Vec<ShotRow> = cleaned
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(i, row)| shot_row(row, i as i64 + 1))
            .filter(|shot| games.contains(&shot.game_id))
            .collect();

        let attempted = shots.len();
        let inserted = insert_shots(&tx, &shots)?;
        let stats = TableCounts::query(&tx)?;
        tx.commit()?;

        let summary = LoadStepSummary::InsertShots {
            attempted,
            inserted,
            skipped: cleaned.len() - attempted,
            shots_total: stats.shots,
        };
        Ok((summary, stats))
    }

    fn verify(&self, cleaned: &Table) -> StoreResult<(LoadStepSummary, TableCounts)> {
        let stats = self.store.counts()?;
        let distinct_games = distinct_game_ids(cleaned).len();

        let verification = Verification::from_checks(vec![
            CountCheck::new("teams", self.directory.len() as i64, stats.teams),
            CountCheck::new("games", distinct_games as i64, stats.games),
            CountCheck::new("shots", cleaned.len() as i64, stats.shots),
        ]);
        Ok((LoadStepSummary::Verify(verification), stats))
    }
}

/// Integer game ids of the cleaned table.
fn distinct_game_ids(cleaned: &Table) -> HashSet<i64> {
    cleaned
        .rows()
        .iter()
        .filter_map(|row| as_i64(row.get("GAME_ID")))
        .collect()
}

fn shot_row(row: &Row, shot_number: i64) -> Option<ShotRow> {
    let game_id = as_i64(row.get("GAME_ID"))?;
    let minutes_remaining = as_i64(row.get("MINUTES_REMAINING"));
    let seconds_remaining = as_i64(row.get("SECONDS_REMAINING"));
    let (time_remaining_display, seconds_remaining_total) = clock(minutes_remaining, seconds_remaining);

    Some(ShotRow {
        game_id,
        shot_number,
        shot_type: as_text(row.get("SHOT_TYPE_STD")),
        shot_made: as_bool(row.get("SHOT_MADE")),
        shot_x: as_f64(row.get("LOC_X")),
        shot_y: as_f64(row.get("LOC_Y")),
        shot_distance: as_f64(row.get("SHOT_DISTANCE")),
        quarter: as_i64(row.get("QUARTER")),
        time_remaining_display,
        seconds_remaining_total,
        season: as_text(row.get("SEASON")),
        is_postseason: as_bool(row.get("IS_POSTSEASON")).unwrap_or(false),
        shot_zone_basic: as_text(row.get("SHOT_ZONE_BASIC")),
        shot_zone_area: as_text(row.get("SHOT_ZONE_AREA")),
        action_type: as_text(row.get("ACTION_TYPE")),
        distance_class: as_text(row.get("DISTANCE_CLASS")),
        minutes_remaining,
        seconds_remaining,
    })
}

/// Load a cleaned table with the default postseason round names.
pub fn load(
    cleaned: &Table,
    directory: &TeamDirectory,
    store: &SqliteStore,
) -> Result<LoadReport, LoadFailure> {
    Loader::new(directory, store).load(cleaned)
}
