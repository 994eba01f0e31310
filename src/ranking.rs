use serde::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::category::{Category, CategoryTable, Direction};
use crate::data_loader::*;
use crate::error::{Result, StandingsError};

// One team's standing in one (week, category) pass.
// rank: 1 is best, tied teams share the mean of the positions they occupy.
// points: team_count + 1 - rank, so the best team earns team_count.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub team_key: String,
    pub week: u32,
    pub category: String,
    pub rank: f64,
    pub points: f64,
    pub value: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExpectedPointsRow {
    pub team: Team,
    pub expected_points: f64,
    pub rank_sum: f64,
    pub category_rank_sums: BTreeMap<String, f64>,
    pub category_points: BTreeMap<String, f64>,
    pub expected_rank: u32,
}

// Fractional competition ranking: sort best first, then every run of equal
// values gets the average of the 1-based positions it covers.
// [10, 10, 8, 5] higher-is-better => [1.5, 1.5, 3, 4]
pub fn competition_ranks(values: &[f64], direction: Direction) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| direction.best_first(values[a], values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }

        let shared = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = shared;
        }
        start = end;
    }

    ranks
}

// Dense ranking, largest first: equal totals share a rank and the next
// distinct total takes the very next integer. [10, 10, 7] => [1, 1, 2]
pub fn dense_ranks_descending(values: &[f64]) -> Vec<u32> {
    let mut distinct = values.to_vec();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup_by(|a, b| a == b);

    values
        .iter()
        .map(|v| {
            let position = distinct.partition_point(|d| d > v);
            position as u32 + 1
        })
        .collect()
}

// Category Ranking Engine: one entry per team for a single (week, category).
// Any team without a value fails the whole pass.
pub fn rank_category(
    week_records: &[&TeamWeekRecord],
    category: &Category,
) -> Result<Vec<RankedEntry>> {
    let values = week_records
        .iter()
        .map(|r| r.value(category))
        .collect::<Result<Vec<f64>>>()?;

    let team_count = values.len() as f64;
    let ranks = competition_ranks(&values, category.direction);

    Ok(week_records
        .iter()
        .zip(values.iter().zip(ranks))
        .map(|(r, (&value, rank))| RankedEntry {
            team_key: r.team.key.clone(),
            week: r.week,
            category: category.name.clone(),
            rank,
            points: team_count + 1.0 - rank,
            value,
        })
        .collect())
}

// Every category pass for one week.
pub fn rank_week(
    week_records: &[&TeamWeekRecord],
    categories: &CategoryTable,
) -> Result<Vec<RankedEntry>> {
    let mut entries = Vec::with_capacity(week_records.len() * categories.len());
    for category in categories {
        entries.extend(rank_category(week_records, category)?);
    }
    Ok(entries)
}

// All passes for the completed weeks 1..current_week. A completed week with
// no rows contributes nothing; a completed week that has rows must have one
// for every team in the table.
pub fn ranking_passes(
    records: &[TeamWeekRecord],
    categories: &CategoryTable,
    current_week: u32,
) -> Result<Vec<RankedEntry>> {
    let teams = unique_teams(records);
    let mut entries = Vec::new();

    for week in 1..current_week {
        let week_records = records_for_week(records, week);
        if week_records.is_empty() {
            warn!("No stat records for completed week {}", week);
            continue;
        }

        if let Some(missing) = teams
            .iter()
            .find(|t| !week_records.iter().any(|r| r.team.key == t.key))
        {
            return Err(StandingsError::MissingTeamWeek {
                team_key: missing.key.clone(),
                week,
            });
        }

        debug!("Ranking {} teams for week {}", week_records.len(), week);
        entries.extend(rank_week(&week_records, categories)?);
    }

    Ok(entries)
}

/// Running totals per team. Entries can be added in any order; totals are
/// plain sums, so the result does not depend on it.
pub struct ExpectedPoints {
    teams: Vec<Team>,
    index: HashMap<String, usize>,
    category_names: Vec<String>,
    rank_sums: Vec<BTreeMap<String, f64>>,
    points: Vec<BTreeMap<String, f64>>,
}

impl ExpectedPoints {
    pub fn new(teams: Vec<Team>, categories: &CategoryTable) -> Self {
        let index = teams
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.key.clone(), idx))
            .collect();
        let zeroed: BTreeMap<String, f64> =
            categories.names().map(|n| (n.to_string(), 0.0)).collect();

        Self {
            rank_sums: vec![zeroed.clone(); teams.len()],
            points: vec![zeroed; teams.len()],
            category_names: categories.names().map(str::to_string).collect(),
            index,
            teams,
        }
    }

    pub fn add(&mut self, entry: &RankedEntry) {
        let Some(&idx) = self.index.get(&entry.team_key) else {
            warn!("Ranked entry for unknown team {}", entry.team_key);
            return;
        };

        *self.rank_sums[idx].entry(entry.category.clone()).or_insert(0.0) += entry.rank;
        *self.points[idx].entry(entry.category.clone()).or_insert(0.0) += entry.points;
    }

    pub fn finish(self) -> Vec<ExpectedPointsRow> {
        let totals: Vec<f64> = self
            .points
            .iter()
            .map(|p| self.category_names.iter().map(|c| p[c]).sum::<f64>())
            .collect();
        let expected_ranks = dense_ranks_descending(&totals);

        self.teams
            .into_iter()
            .zip(self.rank_sums)
            .zip(self.points)
            .zip(totals.into_iter().zip(expected_ranks))
            .map(|(((team, rank_sums), points), (expected_points, expected_rank))| {
                ExpectedPointsRow {
                    team,
                    expected_points,
                    rank_sum: self.category_names.iter().map(|c| rank_sums[c]).sum::<f64>(),
                    category_rank_sums: rank_sums,
                    category_points: points,
                    expected_rank,
                }
            })
            .collect()
    }
}

// Expected Points Aggregator. Fails as a whole if any pass fails.
pub fn expected_points(
    records: &[TeamWeekRecord],
    categories: &CategoryTable,
    current_week: u32,
) -> Result<Vec<ExpectedPointsRow>> {
    info!("Calculating expected points through week {}", current_week.saturating_sub(1));

    let entries = ranking_passes(records, categories, current_week)?;

    let mut totals = ExpectedPoints::new(unique_teams(records), categories);
    for entry in &entries {
        totals.add(entry);
    }

    let rows = totals.finish();
    info!("Calculated expected points for {} teams", rows.len());
    Ok(rows)
}
