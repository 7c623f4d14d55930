//! SQLite access to the match and prediction stores
//!
//! Every operation opens its own connection and drops it on return, so a
//! `Database` value only carries the file location.

use crate::data::season::SeasonScope;
use crate::predict::PredictionRecord;
use crate::{MatchRecord, QuinielaError, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

const MATCH_COLUMNS: &str = "season, division, matchday, date, time, home_team, away_team, score";

/// Handle to the match/prediction database
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database {
            path: path.to_path_buf(),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.connect()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS Matches (
                season TEXT NOT NULL,
                division INTEGER NOT NULL,
                matchday INTEGER NOT NULL,
                date TEXT NOT NULL,
                time TEXT,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                score TEXT
            );

            CREATE TABLE IF NOT EXISTS Predictions (
                season INTEGER NOT NULL,
                division INTEGER NOT NULL,
                matchday INTEGER NOT NULL,
                time REAL NOT NULL,
                home_team TEXT NOT NULL,
                away_team TEXT NOT NULL,
                pred TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_matches_season ON Matches(season);
            CREATE INDEX IF NOT EXISTS idx_matches_matchday ON Matches(season, division, matchday);
            "#,
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Append match rows
    pub fn insert_matches(&self, records: &[MatchRecord]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO Matches ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                MATCH_COLUMNS
            ))?;
            for record in records {
                stmt.execute(params![
                    record.season,
                    record.division,
                    record.matchday,
                    record.date,
                    record.time,
                    record.home_team,
                    record.away_team,
                    record.score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Load every match of the given seasons, in storage order
    pub fn load_historical(&self, scope: &SeasonScope) -> Result<Vec<MatchRecord>> {
        let conn = self.connect()?;
        let matches = match scope {
            SeasonScope::All => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM Matches ORDER BY rowid",
                    MATCH_COLUMNS
                ))?;
                let rows = stmt
                    .query_map([], Self::row_to_match)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                rows
            }
            SeasonScope::Seasons(seasons) => {
                if seasons.is_empty() {
                    Vec::new()
                } else {
                    let placeholders = vec!["?"; seasons.len()].join(", ");
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {} FROM Matches WHERE season IN ({}) ORDER BY rowid",
                        MATCH_COLUMNS, placeholders
                    ))?;
                    let rows = stmt
                        .query_map(params_from_iter(seasons.iter()), Self::row_to_match)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
            }
        };

        if matches.is_empty() {
            return Err(QuinielaError::NoData(format!("seasons {}", scope)));
        }
        log::debug!("Loaded {} matches for seasons {}", matches.len(), scope);
        Ok(matches)
    }

    /// Load the fixtures of one matchday
    pub fn load_matchday(
        &self,
        season: &str,
        division: u8,
        matchday: u32,
    ) -> Result<Vec<MatchRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM Matches
             WHERE season = ?1 AND division = ?2 AND matchday = ?3
             ORDER BY rowid",
            MATCH_COLUMNS
        ))?;
        let matches = stmt
            .query_map(params![season, division, matchday], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if matches.is_empty() {
            return Err(QuinielaError::NoData(format!(
                "matchday {} of division {} in season {}",
                matchday, division, season
            )));
        }
        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<MatchRecord> {
        Ok(MatchRecord {
            season: row.get(0)?,
            division: row.get(1)?,
            matchday: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            home_team: row.get(5)?,
            away_team: row.get(6)?,
            score: row.get(7)?,
        })
    }

    // ==================== Prediction Operations ====================

    /// Append prediction rows
    pub fn save_predictions(&self, records: &[PredictionRecord]) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO Predictions (season, division, matchday, time, home_team, away_team, pred)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.season,
                    record.division,
                    record.matchday,
                    record.time,
                    record.home_team,
                    record.away_team,
                    record.pred,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Read back stored predictions, oldest first
    pub fn load_predictions(&self) -> Result<Vec<PredictionRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT season, division, matchday, time, home_team, away_team, pred
             FROM Predictions ORDER BY rowid",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(PredictionRecord {
                    season: row.get(0)?,
                    division: row.get(1)?,
                    matchday: row.get(2)?,
                    time: row.get(3)?,
                    home_team: row.get(4)?,
                    away_team: row.get(5)?,
                    pred: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let conn = self.connect()?;

        let match_count: i64 = conn.query_row("SELECT COUNT(*) FROM Matches", [], |row| row.get(0))?;
        let season_count: i64 =
            conn.query_row("SELECT COUNT(DISTINCT season) FROM Matches", [], |row| row.get(0))?;
        let prediction_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM Predictions", [], |row| row.get(0))?;

        let earliest_season: Option<String> = conn
            .query_row("SELECT MIN(season) FROM Matches", [], |row| row.get(0))
            .optional()?
            .flatten();
        let latest_season: Option<String> = conn
            .query_row("SELECT MAX(season) FROM Matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            match_count: match_count as usize,
            season_count: season_count as usize,
            prediction_count: prediction_count as usize,
            earliest_season,
            latest_season,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub match_count: usize,
    pub season_count: usize,
    pub prediction_count: usize,
    pub earliest_season: Option<String>,
    pub latest_season: Option<String>,
}
