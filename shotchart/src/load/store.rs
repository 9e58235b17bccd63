//! SQLite relational store.
//!
//! Tables:
//! - teams: reference data seeded from the team directory
//! - games: one row per game, both team references resolved
//! - shots: one row per cleaned shot
//!
//! Every step opens its own connection, runs inside one transaction and
//! drops the connection afterwards. Nothing is pooled or shared.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::models::{GameRow, ShotRow, TeamKey, TeamRow};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS teams (
    team_key INTEGER PRIMARY KEY AUTOINCREMENT,
    external_team_id INTEGER NOT NULL UNIQUE,
    abbreviation TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS games (
    game_id INTEGER PRIMARY KEY,
    game_date TEXT,
    season TEXT,
    is_postseason INTEGER NOT NULL DEFAULT 0,
    postseason_round TEXT,
    team_key INTEGER NOT NULL REFERENCES teams(team_key),
    opponent_team_key INTEGER NOT NULL REFERENCES teams(team_key),
    is_home INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS shots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL REFERENCES games(game_id),
    shot_number INTEGER NOT NULL,
    shot_type TEXT,
    shot_made INTEGER,
    shot_x REAL,
    shot_y REAL,
    shot_distance REAL,
    quarter INTEGER,
    time_remaining_display TEXT,
    seconds_remaining_total INTEGER,
    season TEXT,
    is_postseason INTEGER NOT NULL DEFAULT 0,
    shot_zone_basic TEXT,
    shot_zone_area TEXT,
    action_type TEXT,
    distance_class TEXT,
    minutes_remaining INTEGER,
    seconds_remaining INTEGER
);

CREATE INDEX IF NOT EXISTS shots_game_id ON shots(game_id);
"#;

const SHOT_KEY_INDEX: &str =
    "CREATE UNIQUE INDEX IF NOT EXISTS shots_game_shot_number ON shots(game_id, shot_number);";

const INSERT_SHOT: &str = r#"
INSERT OR IGNORE INTO shots (
    game_id, shot_number, shot_type, shot_made, shot_x, shot_y, shot_distance, quarter,
    time_remaining_display, seconds_remaining_total, season, is_postseason,
    shot_zone_basic, shot_zone_area, action_type, distance_class,
    minutes_remaining, seconds_remaining
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
"#;

/// Uniqueness guard on persisted shots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotKey {
    /// `(game_id, shot_number)` is unique, so reloading a table is a no-op.
    #[default]
    GameSequence,
    /// No key: every load appends its shots.
    None,
}

/// Row totals of the three tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCounts {
    pub teams: i64,
    pub games: i64,
    pub shots: i64,
}

impl TableCounts {
    pub fn query(conn: &Connection) -> StoreResult<Self> {
        Ok(Self {
            teams: count_rows(conn, "teams")?,
            games: count_rows(conn, "games")?,
            shots: count_rows(conn, "shots")?,
        })
    }
}

fn count_rows(conn: &Connection, table: &str) -> StoreResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(conn.query_row(&sql, [], |row| row.get(0))?)
}

/// Handle on a SQLite database file.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteStore {
    path: PathBuf,
    shot_key: ShotKey,
}

impl SqliteStore {
    /// Point at a database file. Nothing is opened until a step runs.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), shot_key: ShotKey::default() }
    }

    pub fn with_shot_key(mut self, shot_key: ShotKey) -> Self {
        self.shot_key = shot_key;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shot_key(&self) -> ShotKey {
        self.shot_key
    }

    /// Open a fresh connection with foreign keys enforced.
    pub fn connect(&self) -> StoreResult<Connection> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    /// Create the tables if they do not exist yet.
    pub fn migrate(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        if self.shot_key == ShotKey::GameSequence {
            conn.execute_batch(SHOT_KEY_INDEX)?;
        }
        Ok(())
    }

    pub fn counts(&self) -> StoreResult<TableCounts> {
        TableCounts::query(&self.connect()?)
    }

    /// Delete every shot, game and team in one transaction.
    pub fn clear(&self) -> StoreResult<()> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch("DELETE FROM shots; DELETE FROM games; DELETE FROM teams;")?;
        tx.commit()?;
        Ok(())
    }
}

// =============================================================================
// Statements shared by the loader steps
// =============================================================================

/// External team id -> internal team key.
pub fn team_keys(conn: &Connection) -> StoreResult<HashMap<i64, TeamKey>> {
    let mut stmt = conn.prepare("SELECT external_team_id, team_key FROM teams")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, TeamKey>(1)?)))?;
    let keys = rows.collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(keys)
}

pub fn game_ids(conn: &Connection) -> StoreResult<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT game_id FROM games")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    let ids = rows.collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(ids)
}

/// Insert a team unless its external id is already present. Returns rows written.
pub fn insert_team(conn: &Connection, team: &TeamRow) -> StoreResult<usize> {
    Ok(conn.execute(
        "INSERT INTO teams (external_team_id, abbreviation, name) VALUES (?1, ?2, ?3)
         ON CONFLICT(external_team_id) DO NOTHING",
        params![team.external_team_id, team.abbreviation, team.name],
    )?)
}

/// Insert a game unless its id is already present. Returns rows written.
pub fn insert_game(conn: &Connection, game: &GameRow) -> StoreResult<usize> {
    Ok(conn.execute(
        "INSERT INTO games (game_id, game_date, season, is_postseason, postseason_round,
                            team_key, opponent_team_key, is_home)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(game_id) DO NOTHING",
        params![
            game.game_id,
            game.game_date.map(|d| d.format("%Y-%m-%d").to_string()),
            game.season,
            game.is_postseason,
            game.postseason_round,
            game.team_key,
            game.opponent_team_key,
            game.is_home,
        ],
    )?)
}

/// Insert shots with one prepared statement. Returns rows written, which is
/// less than `shots.len()` when the shot key rejects duplicates.
pub fn insert_shots(conn: &Connection, shots: &[ShotRow]) -> StoreResult<usize> {
    let mut stmt = conn.prepare(INSERT_SHOT)?;
    let mut written = 0;
    for shot in shots {
        written += stmt.execute(params![
            shot.game_id,
            shot.shot_number,
            shot.shot_type,
            shot.shot_made,
            shot.shot_x,
            shot.shot_y,
            shot.shot_distance,
            shot.quarter,
            shot.time_remaining_display,
            shot.seconds_remaining_total,
            shot.season,
            shot.is_postseason,
            shot.shot_zone_basic,
            shot.shot_zone_area,
            shot.action_type,
            shot.distance_class,
            shot.minutes_remaining,
            shot.seconds_remaining,
        ])?;
    }
    Ok(written)
}
