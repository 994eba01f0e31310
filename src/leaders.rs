use serde::*;
use tracing::{info, warn};

use crate::category::{Category, CategoryTable};
use crate::data_loader::*;
use crate::error::Result;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LeaderRow {
    pub week: u32,
    pub category: String,
    // Display names in input order
    pub teams: Vec<String>,
    // None only for a week with no rows at all
    pub value: Option<f64>,
}

impl LeaderRow {
    pub fn joined_teams(&self) -> String {
        self.teams.join(",")
    }
}

// Single scan keeping the best value seen so far. Starts unset rather than at
// a sentinel, so any legal value can lead.
pub fn category_leader(
    week: u32,
    week_records: &[&TeamWeekRecord],
    category: &Category,
) -> Result<LeaderRow> {
    let mut teams: Vec<String> = Vec::new();
    let mut best: Option<f64> = None;

    for r in week_records {
        let value = r.value(category)?;

        match best {
            Some(current) if category.direction.is_better(value, current) => {
                teams.clear();
                teams.push(r.team.name.clone());
                best = Some(value);
            }
            Some(current) if value == current => teams.push(r.team.name.clone()),
            Some(_) => {}
            None => {
                teams.push(r.team.name.clone());
                best = Some(value);
            }
        }
    }

    Ok(LeaderRow {
        week,
        category: category.name.clone(),
        teams,
        value: best,
    })
}

pub fn week_leaders(
    week: u32,
    week_records: &[&TeamWeekRecord],
    categories: &CategoryTable,
) -> Result<Vec<LeaderRow>> {
    categories
        .iter()
        .map(|c| category_leader(week, week_records, c))
        .collect()
}

// Stat Leader Finder over the collected history: weeks 1 through the last
// week present in the data. No data means an empty report.
pub fn stat_leaders(
    records: &[TeamWeekRecord],
    categories: &CategoryTable,
) -> Result<Vec<LeaderRow>> {
    let Some(last_week) = weeks(records).last().copied() else {
        info!("No weeks of stats found, leader report is empty");
        return Ok(Vec::new());
    };
    info!("Found {} weeks of stats", last_week);

    let mut leaders = Vec::with_capacity(last_week as usize * categories.len());
    for week in 1..=last_week {
        let week_records = records_for_week(records, week);
        if week_records.is_empty() {
            warn!("No stat records for week {}", week);
        }
        leaders.extend(week_leaders(week, &week_records, categories)?);
    }

    Ok(leaders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::error::StandingsError;

    fn record(week: u32, name: &str, values: &[(&str, f64)]) -> TeamWeekRecord {
        TeamWeekRecord {
            week,
            matchup_id: None,
            team: Team {
                key: format!("key.{}", name),
                id: name.to_string(),
                name: name.to_string(),
            },
            result: MatchResult::Win,
            values: values.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn lower_is_better_ties_share_the_lead() {
        let records = vec![
            record(1, "A", &[("ERA", 3.50)]),
            record(1, "B", &[("ERA", 3.50)]),
            record(1, "C", &[("ERA", 4.00)]),
        ];
        let week: Vec<&TeamWeekRecord> = records.iter().collect();

        let row = category_leader(1, &week, &Category::lower("ERA")).unwrap();
        assert_eq!(row.week, 1);
        assert_eq!(row.category, "ERA");
        assert_eq!(row.joined_teams(), "A,B");
        assert_eq!(row.value, Some(3.50));
    }

    #[test]
    fn strictly_better_value_resets_the_set() {
        let records = vec![
            record(1, "A", &[("R", 30.0)]),
            record(1, "B", &[("R", 30.0)]),
            record(1, "C", &[("R", 41.0)]),
            record(1, "D", &[("R", 12.0)]),
        ];
        let week: Vec<&TeamWeekRecord> = records.iter().collect();

        let row = category_leader(1, &week, &Category::higher("R")).unwrap();
        assert_eq!(row.teams, vec!["C"]);
        assert_eq!(row.value, Some(41.0));
    }

    #[test]
    fn values_beyond_any_sentinel_still_lead() {
        let records = vec![
            record(1, "A", &[("ERA", 25000.0)]),
            record(1, "B", &[("ERA", 12000.0)]),
        ];
        let week: Vec<&TeamWeekRecord> = records.iter().collect();

        let row = category_leader(1, &week, &Category::lower("ERA")).unwrap();
        assert_eq!(row.teams, vec!["B"]);
        assert_eq!(row.value, Some(12000.0));
    }

    #[test]
    fn runs_every_week_to_the_last_in_the_data() {
        let table =
            CategoryTable::new(vec![Category::higher("R"), Category::lower("ERA")]).unwrap();
        let records = vec![
            record(1, "A", &[("R", 3.0), ("ERA", 2.0)]),
            record(1, "B", &[("R", 4.0), ("ERA", 3.0)]),
            record(3, "A", &[("R", 9.0), ("ERA", 5.0)]),
            record(3, "B", &[("R", 1.0), ("ERA", 1.0)]),
        ];

        let rows = stat_leaders(&records, &table).unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].joined_teams(), "B");
        assert_eq!(rows[1].joined_teams(), "A");
        // Week 2 has no rows
        assert!(rows[2].teams.is_empty() && rows[2].value.is_none());
        assert_eq!(rows[4].joined_teams(), "A");
        assert_eq!(rows[5].joined_teams(), "B");
    }

    #[test]
    fn empty_input_is_an_empty_report() {
        let table = CategoryTable::new(vec![Category::higher("R")]).unwrap();
        assert!(stat_leaders(&[], &table).unwrap().is_empty());
    }

    #[test]
    fn missing_value_is_an_error() {
        let table = CategoryTable::new(vec![Category::higher("R")]).unwrap();
        let records = vec![record(1, "A", &[("R", 3.0)]), record(1, "B", &[])];
        assert!(matches!(
            stat_leaders(&records, &table),
            Err(StandingsError::MissingCategoryValue { .. })
        ));
    }
}
