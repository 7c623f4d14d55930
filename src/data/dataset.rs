//! Model-ready dataset assembly
//!
//! Runs the feature pipeline (expand, aggregate, numericize) over the
//! matches of a season scope and keeps one row per fixture, seen from the
//! home side.

use crate::data::season::SeasonScope;
use crate::data::Database;
use crate::features::match_repr::expand;
use crate::features::team_stats::{aggregate, RankingRow};
use crate::features::temporal::{numerical_time, SeasonEncoding, SeasonNumericizer};
use crate::features::TeamEncoding;
use crate::{Condition, MatchRecord, QuinielaError, Result, TeamId, Winner};
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use std::collections::HashMap;

/// Names of the model inputs, in the order of [`FeatureRow::features`]
pub const FEATURE_NAMES: [&str; FeatureRow::DIM] = [
    "season",
    "division",
    "matchday",
    "weekday",
    "time",
    "team",
    "rival",
    "last_5_results_local",
    "last_5_results_rival",
];

/// One fixture, numericized
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub season: i32,
    pub division: u8,
    pub matchday: u32,
    pub weekday: u8,
    /// Kick-off as fractional hours
    pub time: f32,
    pub team: TeamId,
    pub rival: TeamId,
    pub condition: Condition,
    pub rank: u32,
    pub points: u32,
    pub goal_diff: i32,
    pub last_5_results_local: i32,
    /// `None` when the rival has no row for the same season and matchday
    pub last_5_results_rival: Option<i32>,
    /// `None` for a fixture not played yet
    pub winner: Option<Winner>,
}

impl FeatureRow {
    pub const DIM: usize = 9;

    /// Model inputs; a missing rival form counts as 0
    pub fn features(&self) -> [f32; Self::DIM] {
        [
            self.season as f32,
            self.division as f32,
            self.matchday as f32,
            self.weekday as f32,
            self.time,
            self.team.0 as f32,
            self.rival.0 as f32,
            self.last_5_results_local as f32,
            self.last_5_results_rival.unwrap_or(0) as f32,
        ]
    }
}

/// Rival form lookup keyed by (season, matchday), then team
#[derive(Debug, Default)]
pub struct RivalFormIndex {
    forms: HashMap<(i32, u32), HashMap<TeamId, i32>>,
}

impl RivalFormIndex {
    pub fn build(rows: &[FeatureRow]) -> Self {
        let mut forms: HashMap<(i32, u32), HashMap<TeamId, i32>> = HashMap::new();
        for row in rows {
            forms
                .entry((row.season, row.matchday))
                .or_default()
                .insert(row.team, row.last_5_results_local);
        }
        RivalFormIndex { forms }
    }

    pub fn get(&self, season: i32, matchday: u32, team: TeamId) -> Option<i32> {
        self.forms.get(&(season, matchday))?.get(&team).copied()
    }
}

/// Numericize the ranking table and keep the local-perspective rows
pub fn assemble(
    table: &[RankingRow],
    encoding: &TeamEncoding,
    seasons: &SeasonNumericizer,
) -> Result<Vec<FeatureRow>> {
    let encode = |name: &str| {
        encoding
            .encode(name)
            .ok_or_else(|| QuinielaError::UnknownTeam(name.to_string()))
    };

    let mut rows = table
        .iter()
        .map(|r| {
            Ok(FeatureRow {
                season: seasons.numericize(&r.season)?,
                division: r.division,
                matchday: r.matchday,
                weekday: r.weekday,
                time: numerical_time(r.time.as_deref())?,
                team: encode(&r.team)?,
                rival: encode(&r.rival)?,
                condition: r.condition,
                rank: r.rank,
                points: r.points,
                goal_diff: r.goal_diff,
                last_5_results_local: r.form_score(),
                last_5_results_rival: None,
                winner: r.winner,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let index = RivalFormIndex::build(&rows);
    for row in &mut rows {
        row.last_5_results_rival = index.get(row.season, row.matchday, row.rival);
    }

    // both perspectives describe the same fixture
    rows.retain(|r| r.condition == Condition::Local);
    Ok(rows)
}

/// Fixtures ready for training or scoring, with the team encoding they use
#[derive(Debug, Clone)]
pub struct QuinielaDataset {
    pub rows: Vec<FeatureRow>,
    pub encoding: TeamEncoding,
    pub seasons: SeasonNumericizer,
}

impl QuinielaDataset {
    /// Training table for a season scope, played fixtures only
    pub fn for_training(
        db: &Database,
        scope: &SeasonScope,
        season_encoding: SeasonEncoding,
    ) -> Result<Self> {
        let matches = db.load_historical(scope)?;
        let encoding = TeamEncoding::from_matches(&matches);
        log::info!(
            "Encoded {} teams from {} matches ({})",
            encoding.len(),
            matches.len(),
            scope
        );
        let mut dataset = Self::from_matches(&matches, encoding, season_encoding)?;

        let fixtures = dataset.len();
        dataset.rows.retain(|r| r.winner.is_some());
        if fixtures > dataset.len() {
            log::debug!("Left out {} unplayed fixtures", fixtures - dataset.len());
        }
        if dataset.is_empty() {
            return Err(QuinielaError::NoData(format!("played matches in {}", scope)));
        }
        Ok(dataset)
    }

    /// Scoring table for one matchday, using the team encoding and season
    /// numericizer the model was trained with. Teams the encoding has never
    /// seen get new ids.
    pub fn for_prediction(
        db: &Database,
        season: &str,
        division: u8,
        matchday: u32,
        encoding: &TeamEncoding,
        seasons: &SeasonNumericizer,
    ) -> Result<Self> {
        let fixtures = db.load_matchday(season, division, matchday)?;
        log::debug!("Matchday {} has {} fixtures", matchday, fixtures.len());

        let matches = db.load_historical(&SeasonScope::single(season))?;
        let (encoding, added) = encoding.extended_with(&matches);
        if !added.is_empty() {
            log::warn!(
                "{} teams unknown to the model, assigned new ids: {}",
                added.len(),
                added.join(", ")
            );
        }

        let mut dataset = Self::from_matches_with(&matches, encoding, *seasons)?;
        dataset
            .rows
            .retain(|r| r.division == division && r.matchday == matchday);
        Ok(dataset)
    }

    /// Run expand -> aggregate -> assemble over in-memory matches, with the
    /// season base taken from the matches themselves
    pub fn from_matches(
        matches: &[MatchRecord],
        encoding: TeamEncoding,
        season_encoding: SeasonEncoding,
    ) -> Result<Self> {
        let seasons =
            SeasonNumericizer::new(season_encoding, matches.iter().map(|m| m.season.as_str()))?;
        Self::from_matches_with(matches, encoding, seasons)
    }

    pub fn from_matches_with(
        matches: &[MatchRecord],
        encoding: TeamEncoding,
        seasons: SeasonNumericizer,
    ) -> Result<Self> {
        let team_rows = expand(matches)?;
        log::debug!("Expanded {} matches into {} team rows", matches.len(), team_rows.len());
        let table = aggregate(&team_rows);
        let rows = assemble(&table, &encoding, &seasons)?;
        log::debug!("Assembled {} fixture rows", rows.len());

        Ok(QuinielaDataset {
            rows,
            encoding,
            seasons,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Dataset<FeatureRow> for QuinielaDataset {
    fn get(&self, index: usize) -> Option<FeatureRow> {
        self.rows.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Batch of fixtures for the classifier
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    /// Raw features: [batch, FeatureRow::DIM]
    pub features: Tensor<B, 2>,
    /// Outcome class per fixture: [batch]
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher for creating classifier batches
#[derive(Clone, Default)]
pub struct FeatureBatcher;

impl<B: Backend> burn::data::dataloader::batcher::Batcher<B, FeatureRow, FeatureBatch<B>>
    for FeatureBatcher
{
    fn batch(&self, items: Vec<FeatureRow>, device: &B::Device) -> FeatureBatch<B> {
        let batch_size = items.len();
        let mut features = Vec::with_capacity(batch_size * FeatureRow::DIM);
        let mut targets = Vec::with_capacity(batch_size);

        for row in &items {
            features.extend(row.features());
            // unplayed fixtures never reach a training batch
            targets.push(row.winner.unwrap_or(Winner::Tie).code() as i32);
        }

        FeatureBatch {
            features: Tensor::<B, 1>::from_floats(features.as_slice(), device)
                .reshape([batch_size, FeatureRow::DIM]),
            targets: Tensor::<B, 1, Int>::from_ints(targets.as_slice(), device),
        }
    }
}
