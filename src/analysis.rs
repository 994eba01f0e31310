// How far the real table sits from the expected one. A positive rank delta
// means a team ranks higher in the league than its weekly numbers earn it,
// i.e. schedule luck.

use serde::*;

use crate::standings::MergedRow;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TeamPerformance {
    pub team_key: String,
    pub team_name: String,
    pub expected_points_share: f64,
    pub win_percentage: Option<f64>,
    pub expected_rank: u32,
    pub actual_rank: Option<u32>,
    pub rank_delta: Option<i64>,
}

pub fn performance(rows: &[MergedRow]) -> Vec<TeamPerformance> {
    let total: f64 = rows.iter().map(|r| r.expected.expected_points).sum();

    rows.iter()
        .map(|r| {
            let actual_rank = r.rank();
            TeamPerformance {
                team_key: r.expected.team.key.clone(),
                team_name: r.expected.team.name.clone(),
                expected_points_share: if total > 0.0 {
                    r.expected.expected_points / total
                } else {
                    0.0
                },
                win_percentage: win_percentage(r),
                expected_rank: r.expected.expected_rank,
                actual_rank,
                rank_delta: actual_rank.map(|a| r.expected.expected_rank as i64 - a as i64),
            }
        })
        .collect()
}

// The league's own percentage when present, else (W + T/2) / games.
fn win_percentage(row: &MergedRow) -> Option<f64> {
    if let Some(pct) = row.field("percentage").and_then(|p| p.parse::<f64>().ok()) {
        return Some(pct);
    }

    let count = |name: &str| row.field(name).and_then(|v| v.parse::<f64>().ok());
    let wins = count("wins")?;
    let losses = count("losses")?;
    let ties = count("ties").unwrap_or(0.0);

    let games = wins + losses + ties;
    if games > 0.0 {
        Some((wins + ties / 2.0) / games)
    } else {
        None
    }
}

// Mean absolute rank delta over the teams that have a league rank.
pub fn fit_error(performance: &[TeamPerformance]) -> Option<f64> {
    let deltas: Vec<i64> = performance.iter().filter_map(|p| p.rank_delta).collect();
    if deltas.is_empty() {
        return None;
    }
    Some(deltas.iter().map(|d| d.abs() as f64).sum::<f64>() / deltas.len() as f64)
}

fn with_league_rank(performance: &[TeamPerformance]) -> Vec<&TeamPerformance> {
    performance.iter().filter(|p| p.rank_delta.is_some()).collect()
}

pub fn luckiest(performance: &[TeamPerformance], n: usize) -> Vec<&TeamPerformance> {
    let mut ranked = with_league_rank(performance);
    ranked.sort_by_key(|p| std::cmp::Reverse(p.rank_delta));
    ranked.truncate(n);
    ranked
}

pub fn unluckiest(performance: &[TeamPerformance], n: usize) -> Vec<&TeamPerformance> {
    let mut ranked = with_league_rank(performance);
    ranked.sort_by_key(|p| p.rank_delta);
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::Team;
    use crate::league::StandingsRow;
    use crate::ranking::ExpectedPointsRow;
    use std::collections::BTreeMap;

    fn merged(
        key: &str,
        points: f64,
        expected_rank: u32,
        standings: Option<(u32, Vec<(&str, &str)>)>,
    ) -> MergedRow {
        MergedRow {
            expected: ExpectedPointsRow {
                team: Team {
                    key: key.to_string(),
                    id: key.to_string(),
                    name: key.to_uppercase(),
                },
                expected_points: points,
                rank_sum: 0.0,
                category_rank_sums: BTreeMap::new(),
                category_points: BTreeMap::new(),
                expected_rank,
            },
            standings: standings.map(|(rank, fields)| StandingsRow {
                team_key: key.to_string(),
                rank: Some(rank),
                fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            }),
        }
    }

    #[test]
    fn shares_and_deltas() {
        let rows = vec![
            merged("a", 60.0, 1, Some((3, vec![("percentage", ".400")]))),
            merged("b", 30.0, 2, Some((1, vec![("wins", "7"), ("losses", "2"), ("ties", "1")]))),
            merged("c", 10.0, 3, None),
        ];

        let perf = performance(&rows);
        assert_eq!(perf[0].expected_points_share, 0.6);
        assert_eq!(perf[0].win_percentage, Some(0.4));
        assert_eq!(perf[0].rank_delta, Some(-2));
        assert_eq!(perf[1].win_percentage, Some(0.75));
        assert_eq!(perf[1].rank_delta, Some(1));
        assert_eq!(perf[2].rank_delta, None);
        assert_eq!(perf[2].win_percentage, None);

        assert_eq!(fit_error(&perf), Some(1.5));
        assert_eq!(luckiest(&perf, 1)[0].team_key, "b");
        assert_eq!(unluckiest(&perf, 1)[0].team_key, "a");
    }

    #[test]
    fn zero_points_share_is_zero() {
        let rows = vec![merged("a", 0.0, 1, None), merged("b", 0.0, 1, None)];
        let perf = performance(&rows);
        assert!(perf.iter().all(|p| p.expected_points_share == 0.0));
        assert_eq!(fit_error(&perf), None);
    }
}
