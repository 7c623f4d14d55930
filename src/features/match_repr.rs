//! Team-centric match representation
//!
//! Every fixture is seen twice: once from the home side ("local") and once
//! from the away side ("visitor"). Fixtures without a score yet keep their
//! rows, with no goals and no result.

use crate::features::temporal;
use crate::{Condition, MatchRecord, MatchResult, Result, Winner};

/// One match seen from one team's side
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMatchRow {
    pub season: String,
    pub division: u8,
    pub matchday: u32,
    pub date: String,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    pub time: Option<String>,
    pub team: String,
    pub rival: String,
    pub condition: Condition,
    /// Fixture outcome, shared by both perspectives; `None` until played
    pub winner: Option<Winner>,
    pub goals_for: Option<u32>,
    pub goals_against: Option<u32>,
    pub result: Option<MatchResult>,
}

impl TeamMatchRow {
    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }

    pub fn goal_diff(&self) -> Option<i32> {
        Some(self.goals_for? as i32 - self.goals_against? as i32)
    }

    pub fn is_win(&self) -> bool {
        self.result == Some(MatchResult::Win)
    }

    pub fn is_loss(&self) -> bool {
        self.result == Some(MatchResult::Loss)
    }

    pub fn is_tie(&self) -> bool {
        self.result == Some(MatchResult::Tie)
    }
}

/// Result for the team playing under `condition`
pub fn match_result(winner: Winner, condition: Condition) -> MatchResult {
    match (winner, condition) {
        (Winner::Tie, _) => MatchResult::Tie,
        (Winner::Local, Condition::Local) | (Winner::Visitor, Condition::Visitor) => {
            MatchResult::Win
        }
        _ => MatchResult::Loss,
    }
}

/// Both perspectives of one fixture, local first
pub fn expand_match(record: &MatchRecord) -> Result<[TeamMatchRow; 2]> {
    let goals = record.goals()?;
    let winner = goals.map(|(home, away)| Winner::from_goals(home, away));
    let weekday = temporal::weekday(&record.date)?;

    let row = |condition: Condition| {
        let (team, rival, side) = match condition {
            Condition::Local => (&record.home_team, &record.away_team, goals),
            Condition::Visitor => (
                &record.away_team,
                &record.home_team,
                goals.map(|(home, away)| (away, home)),
            ),
        };
        TeamMatchRow {
            season: record.season.clone(),
            division: record.division,
            matchday: record.matchday,
            date: record.date.clone(),
            weekday,
            time: record.time.clone(),
            team: team.clone(),
            rival: rival.clone(),
            condition,
            winner,
            goals_for: side.map(|(scored, _)| scored),
            goals_against: side.map(|(_, conceded)| conceded),
            result: winner.map(|w| match_result(w, condition)),
        }
    };

    Ok([row(Condition::Local), row(Condition::Visitor)])
}

/// Expand matches into team-centric rows: all local rows, then all visitor rows
pub fn expand(matches: &[MatchRecord]) -> Result<Vec<TeamMatchRow>> {
    let mut locals = Vec::with_capacity(matches.len());
    let mut visitors = Vec::with_capacity(matches.len());
    for record in matches {
        let [local, visitor] = expand_match(record)?;
        locals.push(local);
        visitors.push(visitor);
    }
    locals.extend(visitors);
    Ok(locals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::tests::make_match;

    #[test]
    fn test_two_mirrored_rows_per_match() {
        let matches = vec![
            make_match("2019-2020", 1, 1, "A", "B", "2:1"),
            make_match("2019-2020", 1, 1, "C", "D", "0:0"),
            make_match("2019-2020", 1, 2, "B", "C", "0:3"),
        ];
        let rows = expand(&matches).unwrap();
        assert_eq!(rows.len(), 2 * matches.len());

        let n = matches.len();
        for i in 0..n {
            let (local, visitor) = (&rows[i], &rows[i + n]);
            assert_eq!(local.condition, Condition::Local);
            assert_eq!(visitor.condition, Condition::Visitor);
            assert_eq!(local.team, visitor.rival);
            assert_eq!(local.rival, visitor.team);
            assert_eq!(local.goals_for, visitor.goals_against);
            assert_eq!(local.goal_diff(), visitor.goal_diff().map(|d| -d));
            assert_eq!(local.winner, visitor.winner);
        }
    }

    #[test]
    fn test_results_per_perspective() {
        let [local, visitor] = expand_match(&make_match("2019-2020", 1, 1, "A", "B", "2:1")).unwrap();
        assert_eq!(local.winner, Some(Winner::Local));
        assert!(local.is_win());
        assert!(visitor.is_loss());

        let [local, visitor] = expand_match(&make_match("2019-2020", 1, 1, "A", "B", "1:1")).unwrap();
        assert_eq!(local.winner, Some(Winner::Tie));
        assert!(local.is_tie() && visitor.is_tie());

        let [local, visitor] = expand_match(&make_match("2019-2020", 1, 1, "A", "B", "0:4")).unwrap();
        assert_eq!(local.result, Some(MatchResult::Loss));
        assert_eq!(visitor.result, Some(MatchResult::Win));
        assert_eq!(visitor.goals_for, Some(4));
    }

    #[test]
    fn test_unplayed_fixture_keeps_both_rows() {
        let [local, visitor] = expand_match(&make_match("2020-2021", 1, 5, "A", "B", "")).unwrap();
        assert!(!local.is_played() && !visitor.is_played());
        assert_eq!(local.winner, None);
        assert_eq!(local.goal_diff(), None);
        assert_eq!(visitor.team, "B");
        assert_eq!(visitor.rival, "A");
    }

    #[test]
    fn test_bad_score_fails() {
        let record = make_match("2019-2020", 1, 1, "A", "B", "postponed");
        assert!(expand(&[record]).is_err());
    }
}
