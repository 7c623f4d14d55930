//! Season labels and the season scope grammar used on the command line
//!
//! A scope is either `all` or a comma-separated list of chunks, each chunk a
//! single season (`2019-2020`) or a half-open range of start years
//! (`2004:2006` expands to `2004-2005,2005-2006`).

use crate::{QuinielaError, Result};
use std::fmt;

/// Set of seasons a pipeline run works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonScope {
    All,
    Seasons(Vec<String>),
}

impl SeasonScope {
    /// Scope holding a single season
    pub fn single(season: &str) -> Self {
        SeasonScope::Seasons(vec![season.to_string()])
    }
}

impl fmt::Display for SeasonScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonScope::All => write!(f, "all"),
            SeasonScope::Seasons(seasons) => write!(f, "{}", seasons.join(",")),
        }
    }
}

/// Parse a season scope specification
pub fn parse_seasons(value: &str) -> Result<SeasonScope> {
    if value == "all" {
        return Ok(SeasonScope::All);
    }

    let malformed = || QuinielaError::MalformedSeasonSpec(value.to_string());
    let mut seasons = Vec::new();

    for chunk in value.split(',') {
        if let Some((start, end)) = chunk.split_once(':') {
            let start: i32 = start.parse().map_err(|_| malformed())?;
            let end: i32 = end.parse().map_err(|_| malformed())?;
            if start >= end {
                return Err(malformed());
            }
            seasons.extend((start..end).map(season_label));
        } else {
            let start = season_start_year(chunk).ok_or_else(malformed)?;
            seasons.push(season_label(start));
        }
    }

    Ok(SeasonScope::Seasons(seasons))
}

/// "2019-2020" for a season starting in 2019
pub fn season_label(start_year: i32) -> String {
    format!("{}-{}", start_year, start_year + 1)
}

/// Start year of a well-formed season label, `None` otherwise
pub fn season_start_year(season: &str) -> Option<i32> {
    let (start, end) = season.split_once('-')?;
    let start: i32 = start.parse().ok()?;
    let end: i32 = end.parse().ok()?;
    (end == start + 1).then_some(start)
}
