//! La Liga match outcome prediction
//!
//! Turns historical match results into per-team, per-matchday standings with
//! rolling form indicators and trains a classifier on them to predict
//! home win / tie / away win.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Integer identifier assigned to a team by a [`features::TeamEncoding`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// A single match row from the `Matches` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Season label, "YYYY-YYYY+1"
    pub season: String,
    pub division: u8,
    pub matchday: u32,
    /// Match date, "MM/DD/YY"
    pub date: String,
    /// Kick-off time on a 12-hour clock ("8:00 PM"), unknown for some fixtures
    pub time: Option<String>,
    pub home_team: String,
    pub away_team: String,
    /// Final score, "home:away"; `None` (or empty) for fixtures not played yet
    pub score: Option<String>,
}

impl MatchRecord {
    /// Parse the score into (home goals, away goals), `None` when unplayed
    pub fn goals(&self) -> Result<Option<(u32, u32)>> {
        let score = match self.score.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(score) => score,
        };
        let malformed = || QuinielaError::Parse(format!("malformed score '{}'", score));
        let (home, away) = score.split_once(':').ok_or_else(malformed)?;
        let home = home.trim().parse::<u32>().map_err(|_| malformed())?;
        let away = away.trim().parse::<u32>().map_err(|_| malformed())?;
        Ok(Some((home, away)))
    }

    /// Match winner from the home side's point of view
    pub fn winner(&self) -> Result<Option<Winner>> {
        Ok(self.goals()?.map(|(home, away)| Winner::from_goals(home, away)))
    }
}

/// Outcome of a fixture, which is also the classifier target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    Local,
    Tie,
    Visitor,
}

impl Winner {
    pub const COUNT: usize = 3;

    pub fn from_goals(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Winner::Local,
            std::cmp::Ordering::Less => Winner::Visitor,
            std::cmp::Ordering::Equal => Winner::Tie,
        }
    }

    /// Class index: 0 Local, 1 Tie, 2 Visitor
    pub fn code(&self) -> u8 {
        match self {
            Winner::Local => 0,
            Winner::Tie => 1,
            Winner::Visitor => 2,
        }
    }

    pub fn from_code(code: usize) -> Option<Self> {
        match code {
            0 => Some(Winner::Local),
            1 => Some(Winner::Tie),
            2 => Some(Winner::Visitor),
            _ => None,
        }
    }

    /// Quiniela ticket symbol
    pub fn label(&self) -> &'static str {
        match self {
            Winner::Local => "1",
            Winner::Tie => "X",
            Winner::Visitor => "2",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Perspective of a team-centric row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Local,
    Visitor,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Local => write!(f, "local"),
            Condition::Visitor => write!(f, "visitor"),
        }
    }
}

/// Result of a match for one team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
    Tie,
}

impl MatchResult {
    /// Contribution to the form score
    pub fn form_points(&self) -> i32 {
        match self {
            MatchResult::Win => 3,
            MatchResult::Tie => 1,
            MatchResult::Loss => -3,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Win => write!(f, "W"),
            MatchResult::Loss => write!(f, "L"),
            MatchResult::Tie => write!(f, "T"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum QuinielaError {
    #[error("No match data for {0}")]
    NoData(String),

    #[error("Unexpected format for seasons '{0}'")]
    MalformedSeasonSpec(String),

    #[error("{path} is not a {expected} model")]
    ModelTypeMismatch { path: String, expected: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, QuinielaError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
    #[serde(default)]
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub models_dir: String,
    pub logs_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub hidden_dims: Vec<usize>,
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub training_season_encoding: features::temporal::SeasonEncoding,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            database_path: "data/laliga.sqlite".to_string(),
            models_dir: "models".to_string(),
            logs_dir: "logs".to_string(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 200,
            batch_size: 256,
            learning_rate: 1e-3,
            hidden_dims: vec![64, 32],
            seed: 15,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QuinielaError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| QuinielaError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| QuinielaError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Location of a named model inside the models directory
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        PathBuf::from(&self.data.models_dir).join(model_name)
    }
}
