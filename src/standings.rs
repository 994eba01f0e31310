use tracing::{info, warn};

use crate::league::{LeagueSnapshot, StandingsRow};
use crate::ranking::ExpectedPointsRow;

// One report row: the expected side always present, the live standings side
// only when the league has a row with the same team key.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub expected: ExpectedPointsRow,
    pub standings: Option<StandingsRow>,
}

impl MergedRow {
    pub fn rank(&self) -> Option<u32> {
        self.standings.as_ref().and_then(|s| s.rank)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.standings
            .as_ref()
            .and_then(|s| s.fields.get(name))
            .map(String::as_str)
    }
}

// Left join on team key, then sort by actual league rank. Rows without a rank
// go last; the sort is stable so equal keys keep their input order.
pub fn merge_standings(
    expected: Vec<ExpectedPointsRow>,
    league: &LeagueSnapshot,
) -> Vec<MergedRow> {
    let mut merged: Vec<MergedRow> = expected
        .into_iter()
        .map(|row| {
            let standings = league.row(&row.team.key).cloned();
            if standings.is_none() {
                warn!("No live standings for team {} ({})", row.team.key, row.team.name);
            }
            MergedRow { expected: row, standings }
        })
        .collect();

    merged.sort_by_key(|m| (m.rank().is_none(), m.rank()));

    info!("Merged {} teams with live standings", merged.len());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::Team;
    use std::collections::BTreeMap;

    fn expected(key: &str, points: f64, rank: u32) -> ExpectedPointsRow {
        ExpectedPointsRow {
            team: Team {
                key: key.to_string(),
                id: key.to_string(),
                name: format!("Team {}", key),
            },
            expected_points: points,
            rank_sum: 0.0,
            category_rank_sums: BTreeMap::new(),
            category_points: BTreeMap::new(),
            expected_rank: rank,
        }
    }

    fn league() -> LeagueSnapshot {
        LeagueSnapshot::from_json(
            r#"{"current_week": 5, "standings": [
                {"team_key": "a", "rank": 2, "outcome_totals": {"wins": 10}},
                {"team_key": "b", "rank": 1, "outcome_totals": {"wins": 20}},
                {"team_key": "z", "rank": 3}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn sorts_by_actual_rank() {
        let rows = vec![expected("a", 30.0, 1), expected("b", 20.0, 2)];
        let merged = merge_standings(rows, &league());
        let keys: Vec<&str> = merged.iter().map(|m| m.expected.team.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(merged[0].field("wins"), Some("20"));
    }

    #[test]
    fn unmatched_team_is_kept_with_null_standings() {
        let merged = merge_standings(
            vec![expected("c", 5.0, 3), expected("a", 30.0, 1), expected("b", 20.0, 2)],
            &league(),
        );

        assert_eq!(merged.len(), 3);
        let last = merged.last().unwrap();
        assert_eq!(last.expected.team.key, "c");
        assert!(last.standings.is_none());
        assert_eq!(last.rank(), None);
        assert_eq!(last.field("wins"), None);
    }

    #[test]
    fn standings_only_teams_are_not_added() {
        let merged = merge_standings(vec![expected("a", 30.0, 1)], &league());
        assert_eq!(merged.len(), 1);
    }
}
