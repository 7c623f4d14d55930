//! Team name <-> integer id encoding
//!
//! Ids are handed out in order of first appearance among home teams, then
//! away-only teams, so the same matches always produce the same mapping.

use crate::data::season::SeasonScope;
use crate::data::Database;
use crate::{MatchRecord, Result, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bijection between team names and ids for one season scope
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamEncoding {
    names: Vec<String>,
    #[serde(skip)]
    ids: HashMap<String, TeamId>,
}

impl TeamEncoding {
    /// Build from the in-scope match set
    pub fn from_matches(matches: &[MatchRecord]) -> Self {
        let mut encoding = TeamEncoding::default();
        for record in matches {
            encoding.insert(&record.home_team);
        }
        for record in matches {
            encoding.insert(&record.away_team);
        }
        encoding
    }

    /// Build from stored names, ids following their order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoding = TeamEncoding::default();
        for name in names {
            encoding.insert(name.as_ref());
        }
        encoding
    }

    /// Load a season scope and encode the teams playing in it
    pub fn for_scope(db: &Database, scope: &SeasonScope) -> Result<Self> {
        let matches = db.load_historical(scope)?;
        Ok(Self::from_matches(&matches))
    }

    /// Add a team if missing, returning its id
    pub fn insert(&mut self, name: &str) -> TeamId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = TeamId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Copy of this encoding extended with any team of `matches` it lacks.
    /// Returns the extended encoding and the names that were added.
    pub fn extended_with(&self, matches: &[MatchRecord]) -> (Self, Vec<String>) {
        let mut extended = self.clone();
        let mut added = Vec::new();
        for name in matches
            .iter()
            .map(|m| &m.home_team)
            .chain(matches.iter().map(|m| &m.away_team))
        {
            if extended.encode(name).is_none() {
                extended.insert(name);
                added.push(name.clone());
            }
        }
        (extended, added)
    }

    pub fn encode(&self, name: &str) -> Option<TeamId> {
        self.ids.get(name).copied()
    }

    pub fn decode(&self, id: TeamId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Team names in id order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Rebuild the name index after deserialization
    pub fn reindexed(self) -> Self {
        Self::from_names(self.names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::tests::{make_match, temp_database};

    #[test]
    fn test_home_teams_first_in_order_of_appearance() {
        let matches = vec![
            make_match("2019-2020", 1, 1, "Sevilla", "Betis", "1:0"),
            make_match("2019-2020", 1, 1, "Getafe", "Sevilla", "1:0"),
            make_match("2019-2020", 1, 2, "Sevilla", "Getafe", "1:0"),
        ];
        let encoding = TeamEncoding::from_matches(&matches);

        assert_eq!(encoding.names(), ["Sevilla", "Getafe", "Betis"]);
        assert_eq!(encoding.encode("Sevilla"), Some(TeamId(0)));
        assert_eq!(encoding.encode("Getafe"), Some(TeamId(1)));
        // only ever away in scope: appended after home teams
        assert_eq!(encoding.encode("Betis"), Some(TeamId(2)));
        assert_eq!(encoding.decode(TeamId(1)), Some("Getafe"));
        assert_eq!(encoding.decode(TeamId(3)), None);
    }

    #[test]
    fn test_deterministic() {
        let matches = vec![
            make_match("2019-2020", 1, 1, "B", "A", "1:0"),
            make_match("2019-2020", 1, 1, "C", "D", "1:0"),
        ];
        assert_eq!(
            TeamEncoding::from_matches(&matches),
            TeamEncoding::from_matches(&matches)
        );
    }

    #[test]
    fn test_extension_keeps_existing_ids() {
        let base = TeamEncoding::from_names(["A", "B"]);
        let matches = vec![make_match("2020-2021", 1, 1, "C", "A", "0:0")];
        let (extended, added) = base.extended_with(&matches);

        assert_eq!(added, vec!["C".to_string()]);
        assert_eq!(extended.encode("A"), Some(TeamId(0)));
        assert_eq!(extended.encode("C"), Some(TeamId(2)));
    }

    #[test]
    fn test_serialized_names_reindex() {
        let encoding = TeamEncoding::from_names(["A", "B"]);
        let json = serde_json::to_string(&encoding).unwrap();
        let restored: TeamEncoding = serde_json::from_str::<TeamEncoding>(&json)
            .unwrap()
            .reindexed();
        assert_eq!(restored, encoding);
    }

    #[test]
    fn test_for_scope_reads_store() {
        let db = temp_database();
        db.insert_matches(&[
            make_match("2018-2019", 1, 1, "Eibar", "Alaves", "2:2"),
            make_match("2019-2020", 1, 1, "Osasuna", "Leganes", "1:0"),
        ])
        .unwrap();

        let encoding = TeamEncoding::for_scope(&db, &SeasonScope::single("2019-2020")).unwrap();
        assert_eq!(encoding.names(), ["Osasuna", "Leganes"]);
        assert_eq!(TeamEncoding::for_scope(&db, &SeasonScope::All).unwrap().len(), 4);
    }
}
