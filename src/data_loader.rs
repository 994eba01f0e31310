// Loads the per-team, per-week stat table.
// Names are remapped here and nowhere else; every join downstream uses the
// team key.

use serde::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::category::{Category, CategoryTable};
use crate::error::{Result, StandingsError};
use crate::util::*;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Team {
    pub key: String,
    pub id: String,
    pub name: String,
}

// Stored the way the provider export encodes it: 1 win, 0 loss, -1 tie.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    #[serde(rename = "1")]
    Win,
    #[serde(rename = "0")]
    Loss,
    #[serde(rename = "-1")]
    Tie,
}

impl MatchResult {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "1" | "win" | "w" => Some(MatchResult::Win),
            "0" | "loss" | "l" => Some(MatchResult::Loss),
            "-1" | "tie" | "t" => Some(MatchResult::Tie),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchResult::Win => "1",
            MatchResult::Loss => "0",
            MatchResult::Tie => "-1",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamWeekRecord {
    pub week: u32,
    pub matchup_id: Option<u32>,
    pub team: Team,
    pub result: MatchResult,

    // Category name => raw value. A category missing here is a data error
    // once a ranking pass asks for it.
    pub values: BTreeMap<String, f64>,
}

impl TeamWeekRecord {
    pub fn value(&self, category: &Category) -> Result<f64> {
        self.values
            .get(&category.name)
            .copied()
            .ok_or_else(|| StandingsError::MissingCategoryValue {
                team_key: self.team.key.clone(),
                week: self.week,
                category: category.name.clone(),
            })
    }
}

pub fn load_stats_csv(
    file_path: &Path,
    categories: &CategoryTable,
    team_name_mapping: &BTreeMap<String, String>,
) -> Result<Vec<TeamWeekRecord>> {
    let file = File::open(file_path)?;
    let records = read_stats(file, categories, team_name_mapping)?;
    info!("Loaded {} stat records from {}", records.len(), file_path.display());
    Ok(records)
}

// Columns are located by header name so extra provider columns (matchup_id,
// H/AB, ...) can sit anywhere. Rows with the wrong field count fail in csv.
pub fn read_stats<R: io::Read>(
    rdr: R,
    categories: &CategoryTable,
    team_name_mapping: &BTreeMap<String, String>,
) -> Result<Vec<TeamWeekRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StandingsError::MissingColumn { column: name.to_string() })
    };

    let week_col = column("week")?;
    let key_col = column("team_key")?;
    let id_col = column("team_id")?;
    let name_col = column("team_name")?;
    let result_col = column("result")?;
    let matchup_col = headers.iter().position(|h| h == "matchup_id");
    let category_cols = categories
        .iter()
        .map(|c| Ok((c, column(&c.name)?)))
        .collect::<Result<Vec<(&Category, usize)>>>()?;

    let mut records = Vec::new();
    let mut seen: HashSet<(u32, String)> = HashSet::new();

    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(idx as u64 + 2);
        let field = |col: usize| row.get(col).unwrap_or("");
        let malformed = |reason: String| StandingsError::MalformedRecord { line, reason };

        let week: u32 = field(week_col)
            .parse()
            .ok()
            .filter(|w| *w >= 1)
            .ok_or_else(|| malformed(format!("invalid week {:?}", field(week_col))))?;

        let key = field(key_col);
        if key.is_empty() {
            return Err(malformed("empty team_key".to_string()));
        }

        let result = MatchResult::parse(field(result_col))
            .ok_or_else(|| malformed(format!("invalid result {:?}", field(result_col))))?;

        let matchup_id = match matchup_col.map(field) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| malformed(format!("invalid matchup_id {:?}", raw)))?,
            ),
        };

        let mut values = BTreeMap::new();
        for (category, col) in &category_cols {
            match parse_stat_value(field(*col)) {
                Ok(Some(v)) => {
                    values.insert(category.name.clone(), v);
                }
                Ok(None) => debug!("Week {} team {} has no {} value", week, key, category.name),
                Err(InvalidStatValue(raw)) => {
                    return Err(StandingsError::InvalidCategoryValue {
                        team_key: key.to_string(),
                        week,
                        category: category.name.clone(),
                        raw,
                    })
                }
            }
        }

        if !seen.insert((week, key.to_string())) {
            return Err(StandingsError::DuplicateRecord { team_key: key.to_string(), week });
        }

        records.push(TeamWeekRecord {
            week,
            matchup_id,
            team: Team {
                key: key.to_string(),
                id: field(id_col).to_string(),
                name: sanitize_team_name(field(name_col), team_name_mapping),
            },
            result,
            values,
        });
    }

    Ok(records)
}

// Every team once, in order of first appearance.
pub fn unique_teams(records: &[TeamWeekRecord]) -> Vec<Team> {
    let mut teams: Vec<Team> = Vec::new();

    for r in records {
        match teams.iter().find(|t| t.key == r.team.key) {
            Some(t) if t.name != r.team.name => warn!(
                "Team {} appears as both {:?} and {:?}, keeping the first",
                t.key, t.name, r.team.name
            ),
            Some(_) => {}
            None => teams.push(r.team.clone()),
        }
    }

    teams
}

pub fn weeks(records: &[TeamWeekRecord]) -> BTreeSet<u32> {
    records.iter().map(|r| r.week).collect()
}

pub fn records_for_week(records: &[TeamWeekRecord], week: u32) -> Vec<&TeamWeekRecord> {
    records.iter().filter(|r| r.week == week).collect()
}
