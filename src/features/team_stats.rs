//! Season standings and recent form
//!
//! Walks every team's matches of a season in matchday order, keeping running
//! totals (goals, wins, losses, ties) and the results of the previous five
//! matches, then ranks the teams of each matchday by points and goal
//! difference. Unplayed fixtures get a row but leave the totals alone.

use crate::features::match_repr::TeamMatchRow;
use crate::{Condition, MatchResult, Winner};
use std::collections::{HashMap, VecDeque};

/// Number of previous results that make up the form score
pub const FORM_WINDOW: usize = 5;

/// Results of the previous matches, most recent first; `None` where the team
/// had not played that many matches yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecentForm(pub [Option<MatchResult>; FORM_WINDOW]);

impl RecentForm {
    /// Signed form score: W +3, T +1, L -3, missing 0
    pub fn score(&self) -> i32 {
        self.0.iter().flatten().map(MatchResult::form_points).sum()
    }

    /// Number of slots holding a result
    pub fn coverage(&self) -> usize {
        self.0.iter().flatten().count()
    }
}

/// Running season totals for one team
#[derive(Debug, Clone, Default)]
pub struct TeamSeasonState {
    pub goals_for: u32,
    pub goals_against: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    recent: VecDeque<MatchResult>,
}

impl TeamSeasonState {
    /// Form going into the next match
    pub fn recent_form(&self) -> RecentForm {
        let mut slots = [None; FORM_WINDOW];
        for (slot, result) in slots.iter_mut().zip(self.recent.iter()) {
            *slot = Some(*result);
        }
        RecentForm(slots)
    }

    /// Add a match to the totals; unplayed fixtures are ignored
    pub fn update(&mut self, row: &TeamMatchRow) {
        let (Some(result), Some(scored), Some(conceded)) =
            (row.result, row.goals_for, row.goals_against)
        else {
            return;
        };
        self.goals_for += scored;
        self.goals_against += conceded;
        match result {
            MatchResult::Win => self.wins += 1,
            MatchResult::Loss => self.losses += 1,
            MatchResult::Tie => self.ties += 1,
        }

        self.recent.push_front(result);
        self.recent.truncate(FORM_WINDOW);
    }

    pub fn goal_diff(&self) -> i32 {
        self.goals_for as i32 - self.goals_against as i32
    }

    pub fn points(&self) -> u32 {
        self.wins * 3 + self.ties
    }
}

/// A team's standing after one matchday
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub season: String,
    pub division: u8,
    pub matchday: u32,
    pub date: String,
    pub weekday: u8,
    pub time: Option<String>,
    /// Position within (season, division, matchday), 1-based
    pub rank: u32,
    pub team: String,
    pub rival: String,
    pub condition: Condition,
    /// `None` for a fixture not played yet
    pub winner: Option<Winner>,
    pub match_goals_for: Option<u32>,
    pub match_goals_against: Option<u32>,
    pub match_goal_diff: Option<i32>,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_diff: i32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points: u32,
    pub last_results: RecentForm,
}

impl RankingRow {
    pub fn form_score(&self) -> i32 {
        self.last_results.score()
    }
}

/// Build the ranking table from team-centric rows.
///
/// Totals include the row's own match, so a row describes the table after
/// that matchday; the form only looks at earlier matches.
pub fn aggregate(rows: &[TeamMatchRow]) -> Vec<RankingRow> {
    let mut sorted: Vec<&TeamMatchRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.season, a.division, &a.team, a.matchday).cmp(&(&b.season, b.division, &b.team, b.matchday))
    });

    let mut states: HashMap<(&str, &str), TeamSeasonState> = HashMap::new();
    let mut table: Vec<RankingRow> = Vec::with_capacity(sorted.len());

    for row in sorted {
        let state = states
            .entry((row.season.as_str(), row.team.as_str()))
            .or_default();
        let last_results = state.recent_form();
        state.update(row);

        table.push(RankingRow {
            season: row.season.clone(),
            division: row.division,
            matchday: row.matchday,
            date: row.date.clone(),
            weekday: row.weekday,
            time: row.time.clone(),
            rank: 0,
            team: row.team.clone(),
            rival: row.rival.clone(),
            condition: row.condition,
            winner: row.winner,
            match_goals_for: row.goals_for,
            match_goals_against: row.goals_against,
            match_goal_diff: row.goal_diff(),
            goals_for: state.goals_for,
            goals_against: state.goals_against,
            goal_diff: state.goal_diff(),
            wins: state.wins,
            losses: state.losses,
            ties: state.ties,
            points: state.points(),
            last_results,
        });
    }

    rank(table)
}

/// Order by season (latest first), division, matchday, then points and goal
/// difference, and number each (season, division, matchday) group from 1.
/// Equal teams keep their incoming order.
fn rank(mut table: Vec<RankingRow>) -> Vec<RankingRow> {
    table.sort_by(|a, b| {
        b.season
            .cmp(&a.season)
            .then(a.division.cmp(&b.division))
            .then(a.matchday.cmp(&b.matchday))
            .then(b.points.cmp(&a.points))
            .then(b.goal_diff.cmp(&a.goal_diff))
    });

    let mut position = 0;
    for i in 0..table.len() {
        let same_group = i > 0 && {
            let (prev, cur) = (&table[i - 1], &table[i]);
            prev.season == cur.season && prev.division == cur.division && prev.matchday == cur.matchday
        };
        position = if same_group { position + 1 } else { 1 };
        table[i].rank = position;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::tests::make_match;
    use crate::features::match_repr::expand;

    fn table_for(matches: &[crate::MatchRecord]) -> Vec<RankingRow> {
        aggregate(&expand(matches).unwrap())
    }

    fn find<'a>(table: &'a [RankingRow], team: &str, matchday: u32) -> &'a RankingRow {
        table
            .iter()
            .find(|r| r.team == team && r.matchday == matchday)
            .unwrap()
    }

    #[test]
    fn test_two_matchday_scenario() {
        let table = table_for(&[
            make_match("2019-2020", 1, 1, "A", "B", "2:1"),
            make_match("2019-2020", 1, 2, "B", "A", "0:0"),
        ]);

        let a = find(&table, "A", 2);
        assert_eq!(a.points, 4);
        assert_eq!(a.goal_diff, 1);
        assert_eq!(a.rank, 1);

        let b = find(&table, "B", 2);
        assert_eq!(b.points, 1);
        assert_eq!(b.goal_diff, -1);
        assert_eq!(b.rank, 2);
    }

    #[test]
    fn test_totals_include_current_match() {
        let table = table_for(&[make_match("2019-2020", 1, 1, "A", "B", "3:0")]);
        let a = find(&table, "A", 1);
        assert_eq!((a.goals_for, a.goals_against, a.wins), (3, 0, 1));
        assert_eq!(a.points, 3);
    }

    #[test]
    fn test_no_prior_matches_means_zero_form() {
        let table = table_for(&[
            make_match("2019-2020", 1, 1, "A", "B", "3:0"),
            make_match("2020-2021", 1, 1, "B", "A", "3:0"),
        ]);
        for row in &table {
            assert_eq!(row.last_results.coverage(), 0);
            assert_eq!(row.form_score(), 0);
        }
    }

    #[test]
    fn test_form_uses_previous_five_most_recent_first() {
        // A: W, W, T, L, W, L, then matchday 7
        let scores = ["1:0", "2:0", "1:1", "0:1", "3:2", "0:2", "1:1"];
        let matches: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, score)| make_match("2019-2020", 1, i as u32 + 1, "A", "B", score))
            .collect();
        let table = table_for(&matches);

        let md2 = find(&table, "A", 2);
        assert_eq!(md2.last_results.0[0], Some(MatchResult::Win));
        assert_eq!(md2.last_results.coverage(), 1);
        assert_eq!(md2.form_score(), 3);

        let md7 = find(&table, "A", 7);
        assert_eq!(
            md7.last_results.0,
            [
                Some(MatchResult::Loss),
                Some(MatchResult::Win),
                Some(MatchResult::Loss),
                Some(MatchResult::Tie),
                Some(MatchResult::Win),
            ]
        );
        assert_eq!(md7.form_score(), -3 + 3 - 3 + 1 + 3);

        // B sees the mirror image
        assert_eq!(find(&table, "B", 7).form_score(), 3 - 3 + 3 + 1 - 3);
    }

    #[test]
    fn test_ranks_are_permutations_ordered_by_points() {
        let table = table_for(&[
            make_match("2019-2020", 1, 1, "A", "B", "2:1"),
            make_match("2019-2020", 1, 1, "C", "D", "0:0"),
            make_match("2019-2020", 1, 1, "E", "F", "0:5"),
            make_match("2019-2020", 1, 2, "B", "C", "1:1"),
            make_match("2019-2020", 1, 2, "D", "E", "2:0"),
            make_match("2019-2020", 1, 2, "F", "A", "1:1"),
            make_match("2019-2020", 2, 1, "G", "H", "1:0"),
        ]);

        let mut groups: HashMap<(String, u8, u32), Vec<&RankingRow>> = HashMap::new();
        for row in &table {
            groups
                .entry((row.season.clone(), row.division, row.matchday))
                .or_default()
                .push(row);
        }

        for rows in groups.values() {
            let mut ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, (1..=rows.len() as u32).collect::<Vec<_>>());

            for a in rows {
                for b in rows {
                    if a.points > b.points {
                        assert!(a.rank < b.rank);
                    }
                    if a.points == b.points && a.goal_diff > b.goal_diff {
                        assert!(a.rank < b.rank);
                    }
                }
            }
        }
    }

    #[test]
    fn test_ties_keep_team_order() {
        let table = table_for(&[
            make_match("2019-2020", 1, 1, "Zaragoza", "Alaves", "1:1"),
            make_match("2019-2020", 1, 1, "Osasuna", "Cadiz", "0:0"),
        ]);
        let order: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();
        // everyone on 1 point and goal difference 0
        assert_eq!(order, ["Alaves", "Cadiz", "Osasuna", "Zaragoza"]);
        assert_eq!(table[0].rank, 1);
        assert_eq!(table[3].rank, 4);
    }

    #[test]
    fn test_latest_season_first() {
        let table = table_for(&[
            make_match("2018-2019", 1, 1, "A", "B", "1:0"),
            make_match("2019-2020", 1, 1, "A", "B", "1:0"),
        ]);
        assert_eq!(table[0].season, "2019-2020");
        assert_eq!(table.last().unwrap().season, "2018-2019");
    }

    #[test]
    fn test_unplayed_matchday_carries_standings() {
        let table = table_for(&[
            make_match("2020-2021", 1, 1, "A", "B", "2:0"),
            make_match("2020-2021", 1, 2, "B", "A", "1:1"),
            make_match("2020-2021", 1, 3, "A", "B", ""),
        ]);

        let a = find(&table, "A", 3);
        assert_eq!(a.winner, None);
        assert_eq!(a.match_goal_diff, None);
        assert_eq!((a.points, a.goal_diff, a.rank), (4, 2, 1));
        assert_eq!(a.form_score(), 1 + 3);
        assert_eq!(a.last_results.coverage(), 2);

        let b = find(&table, "B", 3);
        assert_eq!((b.points, b.goal_diff, b.rank), (1, -2, 2));
    }
}
