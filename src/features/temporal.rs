//! Temporal feature extraction
//!
//! Calendar and clock fields of a fixture turned into numbers: weekday of the
//! match date, kick-off hour, and the numeric form of the season label.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::data::season::season_start_year;
use crate::{QuinielaError, Result};

/// Kick-off hour assumed when a fixture has no time
pub const DEFAULT_KICKOFF_HOURS: f32 = 12.0;

/// Parse a stored match date.
///
/// Dates are kept as `MM/DD/YY` with the year counted from 2000; ISO dates are
/// accepted too.
pub fn parse_match_date(date: &str) -> Result<NaiveDate> {
    let malformed = || QuinielaError::Parse(format!("malformed match date '{}'", date));

    if let Ok(iso) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Ok(iso);
    }

    let mut parts = date.trim().split('/');
    let (Some(month), Some(day), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    let month: u32 = month.parse().map_err(|_| malformed())?;
    let day: u32 = day.parse().map_err(|_| malformed())?;
    let year: i32 = year.parse().map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year + 2000, month, day).ok_or_else(malformed)
}

/// Day of week, 0 = Monday .. 6 = Sunday
pub fn weekday(date: &str) -> Result<u8> {
    Ok(parse_match_date(date)?.weekday().num_days_from_monday() as u8)
}

/// Kick-off time as fractional hours ("8:30 PM" -> 20.5)
pub fn numerical_time(time: Option<&str>) -> Result<f32> {
    let Some(time) = time else {
        return Ok(DEFAULT_KICKOFF_HOURS);
    };
    let parsed = NaiveTime::parse_from_str(time.trim(), "%I:%M %p")
        .map_err(|_| QuinielaError::Parse(format!("malformed kick-off time '{}'", time)))?;
    Ok(parsed.hour() as f32 + parsed.minute() as f32 / 60.0)
}

/// How the season label becomes a model feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonEncoding {
    /// Years before the most recent training season (latest = 0)
    Offset,
    /// Start year of the season
    #[default]
    Year,
}

/// Maps season labels to their numeric feature value.
///
/// Stored with a trained model so that prediction numericizes seasons
/// against the same base as training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonNumericizer {
    encoding: SeasonEncoding,
    latest_start: i32,
}

impl SeasonNumericizer {
    /// Build from every season present in the table being numericized
    pub fn new<'a, I>(encoding: SeasonEncoding, seasons: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut latest_start = None;
        for season in seasons {
            let start = start_year(season)?;
            latest_start = Some(latest_start.map_or(start, |l: i32| l.max(start)));
        }
        let latest_start = latest_start
            .ok_or_else(|| QuinielaError::NoData("seasons to numericize".to_string()))?;

        Ok(SeasonNumericizer {
            encoding,
            latest_start,
        })
    }

    pub fn numericize(&self, season: &str) -> Result<i32> {
        let start = start_year(season)?;
        Ok(match self.encoding {
            SeasonEncoding::Offset => self.latest_start - start,
            SeasonEncoding::Year => start,
        })
    }
}

fn start_year(season: &str) -> Result<i32> {
    season_start_year(season)
        .ok_or_else(|| QuinielaError::Parse(format!("malformed season '{}'", season)))
}
