//! Matchday prediction formatting

use crate::data::dataset::FeatureRow;
use crate::features::TeamEncoding;
use crate::{QuinielaError, Result, TeamId, Winner};
use std::fmt::Write;

/// Width of the report separator line
const RULE_WIDTH: usize = 70;

/// A scored fixture with team names restored
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPrediction {
    pub season: i32,
    pub division: u8,
    pub matchday: u32,
    pub weekday: u8,
    pub time: f32,
    pub team: String,
    pub rival: String,
    pub last_5_results_local: i32,
    pub last_5_results_rival: Option<i32>,
    pub pred: Winner,
    /// `[p_1, p_X, p_2]`
    pub probabilities: [f32; 3],
}

/// Row of the Predictions table
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub season: i32,
    pub division: u8,
    pub matchday: u32,
    pub time: f64,
    pub home_team: String,
    pub away_team: String,
    pub pred: String,
}

impl AnnotatedPrediction {
    pub fn to_record(&self) -> PredictionRecord {
        PredictionRecord {
            season: self.season,
            division: self.division,
            matchday: self.matchday,
            time: self.time as f64,
            home_team: self.team.clone(),
            away_team: self.rival.clone(),
            pred: self.pred.label().to_string(),
        }
    }
}

/// Attach predictions to their fixtures and decode team ids
pub fn annotate(
    rows: &[FeatureRow],
    probabilities: &[[f32; 3]],
    encoding: &TeamEncoding,
) -> Result<Vec<AnnotatedPrediction>> {
    if rows.len() != probabilities.len() {
        return Err(QuinielaError::Model(format!(
            "{} fixtures but {} predictions",
            rows.len(),
            probabilities.len()
        )));
    }

    let decode = |id: TeamId| {
        encoding
            .decode(id)
            .map(str::to_string)
            .ok_or_else(|| QuinielaError::UnknownTeam(id.to_string()))
    };

    rows.iter()
        .zip(probabilities)
        .map(|(row, p)| {
            Ok(AnnotatedPrediction {
                season: row.season,
                division: row.division,
                matchday: row.matchday,
                weekday: row.weekday,
                time: row.time,
                team: decode(row.team)?,
                rival: decode(row.rival)?,
                last_5_results_local: row.last_5_results_local,
                last_5_results_rival: row.last_5_results_rival,
                pred: crate::model::mlp::most_likely(p),
                probabilities: *p,
            })
        })
        .collect()
}

/// Console report for one matchday
pub fn render_report(
    season: &str,
    division: u8,
    matchday: u32,
    predictions: &[AnnotatedPrediction],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Matchday {} - LaLiga - Division {} - Season {}",
        matchday, division, season
    );
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    for p in predictions {
        let [p1, px, p2] = p.probabilities;
        let _ = writeln!(
            out,
            "{:^30} vs {:^30} --> Pred: {} | Prob: 1: {:.2}, X: {:.2}, 2: {:.2}",
            p.team, p.rival, p.pred, p1, px, p2
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Condition;

    fn row(team: u32, rival: u32) -> FeatureRow {
        FeatureRow {
            season: 2021,
            division: 1,
            matchday: 3,
            weekday: 5,
            time: 21.0,
            team: TeamId(team),
            rival: TeamId(rival),
            condition: Condition::Local,
            rank: 2,
            points: 4,
            goal_diff: 1,
            last_5_results_local: 4,
            last_5_results_rival: Some(-2),
            winner: Some(Winner::Tie),
        }
    }

    fn encoding() -> TeamEncoding {
        TeamEncoding::from_names(["Real Madrid", "Barcelona", "Sevilla"])
    }

    #[test]
    fn test_annotate_decodes_and_labels() {
        let rows = [row(0, 1), row(2, 0)];
        let probabilities = [[0.5, 0.3, 0.2], [0.1, 0.2, 0.7]];
        let annotated = annotate(&rows, &probabilities, &encoding()).unwrap();

        assert_eq!(annotated[0].team, "Real Madrid");
        assert_eq!(annotated[0].rival, "Barcelona");
        assert_eq!(annotated[0].pred, Winner::Local);
        assert_eq!(annotated[1].team, "Sevilla");
        assert_eq!(annotated[1].pred, Winner::Visitor);
        assert_eq!(annotated[1].probabilities, [0.1, 0.2, 0.7]);
    }

    #[test]
    fn test_annotate_rejects_unknown_id_and_length_mismatch() {
        assert!(matches!(
            annotate(&[row(0, 9)], &[[0.3, 0.3, 0.4]], &encoding()),
            Err(QuinielaError::UnknownTeam(_))
        ));
        assert!(annotate(&[row(0, 1)], &[], &encoding()).is_err());
    }

    #[test]
    fn test_record_keeps_persisted_columns() {
        let annotated = annotate(&[row(1, 2)], &[[0.2, 0.5, 0.3]], &encoding()).unwrap();
        let record = annotated[0].to_record();
        assert_eq!(
            record,
            PredictionRecord {
                season: 2021,
                division: 1,
                matchday: 3,
                time: 21.0,
                home_team: "Barcelona".to_string(),
                away_team: "Sevilla".to_string(),
                pred: "X".to_string(),
            }
        );
    }

    #[test]
    fn test_report_layout() {
        let annotated = annotate(&[row(0, 1)], &[[0.5, 0.25, 0.25]], &encoding()).unwrap();
        let report = render_report("2021-2022", 1, 3, &annotated);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Matchday 3 - LaLiga - Division 1 - Season 2021-2022");
        assert_eq!(lines[1], "=".repeat(70));
        assert_eq!(
            lines[2],
            format!(
                "{:^30} vs {:^30} --> Pred: 1 | Prob: 1: 0.50, X: 0.25, 2: 0.25",
                "Real Madrid", "Barcelona"
            )
        );
        assert_eq!(lines.len(), 3);
    }
}
