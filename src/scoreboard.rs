// Typed view of a saved league scoreboard document (one per week).
//
// The provider nests everything in numbered objects ("0", "1", ..., "count")
// and positional arrays of single-key objects. The untagged enums below pick
// the parts we need out of that; nothing outside this module sees the raw
// shape.

use serde::*;
use serde_aux::field_attributes::{
    deserialize_bool_from_anything, deserialize_option_number_from_string,
    deserialize_string_from_number,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::category::CategoryTable;
use crate::data_loader::{MatchResult, Team, TeamWeekRecord};
use crate::error::{Result, StandingsError};
use crate::util::*;

#[derive(Deserialize, Debug)]
struct ScoreboardDocument {
    fantasy_content: FantasyContent,
}

// League metadata and the scoreboard share one array. Parts are kept raw
// until the scoreboard is found, then that one part is read strictly.
#[derive(Deserialize, Debug)]
struct FantasyContent {
    league: Vec<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct Scoreboard {
    #[serde(rename = "0")]
    body: ScoreboardBody,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    week: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct ScoreboardBody {
    matchups: BTreeMap<String, MatchupSlot>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum MatchupSlot {
    Matchup { matchup: Matchup },
    Count(u32),
}

#[derive(Deserialize, Debug)]
struct Matchup {
    #[serde(default)]
    winner_team_key: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_from_anything")]
    is_tied: bool,
    #[serde(rename = "0")]
    body: MatchupBody,
}

#[derive(Deserialize, Debug)]
struct MatchupBody {
    teams: BTreeMap<String, TeamSlot>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TeamSlot {
    Team { team: Vec<TeamPart> },
    Count(u32),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TeamPart {
    Info(Vec<TeamInfoItem>),
    Stats { team_stats: TeamStats },
    Other(serde_json::Value),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TeamInfoItem {
    Key {
        team_key: String,
    },
    Id {
        #[serde(deserialize_with = "deserialize_string_from_number")]
        team_id: String,
    },
    Name {
        name: String,
    },
    Other(serde_json::Value),
}

#[derive(Deserialize, Debug)]
struct TeamStats {
    stats: Vec<StatEntry>,
}

#[derive(Deserialize, Debug)]
struct StatEntry {
    stat: StatValue,
}

#[derive(Deserialize, Debug)]
struct StatValue {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    stat_id: String,
    #[serde(default)]
    value: serde_json::Value,
}

fn malformed(reason: String) -> StandingsError {
    StandingsError::MalformedScoreboard { reason }
}

/// Turns one week's scoreboard document into stat records.
///
/// `week` is the week the document was requested for; if the document states
/// its own week that one wins. Only categories with a provider `stat_id` are
/// picked up, blank or `-` stat values are left absent.
pub fn parse_week(
    json: &str,
    week: u32,
    categories: &CategoryTable,
    team_name_mapping: &BTreeMap<String, String>,
) -> Result<Vec<TeamWeekRecord>> {
    let document: ScoreboardDocument = serde_json::from_str(json)?;

    let raw = document
        .fantasy_content
        .league
        .into_iter()
        .find_map(|mut part| part.get_mut("scoreboard").map(serde_json::Value::take))
        .ok_or_else(|| malformed("no scoreboard in league".to_string()))?;
    let scoreboard: Scoreboard = serde_json::from_value(raw)
        .map_err(|e| malformed(format!("week {} scoreboard: {}", week, e)))?;

    let week = match scoreboard.week {
        Some(w) if w != week => {
            warn!("Scoreboard requested for week {} reports week {}", week, w);
            w
        }
        Some(w) => w,
        None => week,
    };

    let mut records = Vec::new();

    for (slot_key, slot) in scoreboard.body.matchups {
        let matchup = match slot {
            MatchupSlot::Matchup { matchup } => matchup,
            MatchupSlot::Count(_) => continue,
        };
        let matchup_id: u32 = slot_key
            .parse()
            .map_err(|_| malformed(format!("unexpected matchup key {:?}", slot_key)))?;

        for (_, team_slot) in matchup.body.teams {
            let parts = match team_slot {
                TeamSlot::Team { team } => team,
                TeamSlot::Count(_) => continue,
            };

            let (team, values) = parse_team(parts, week, categories, team_name_mapping)?;

            let result = match (&matchup.winner_team_key, matchup.is_tied) {
                (Some(winner), false) if *winner == team.key => MatchResult::Win,
                (Some(_), false) => MatchResult::Loss,
                _ => MatchResult::Tie,
            };

            records.push(TeamWeekRecord {
                week,
                matchup_id: Some(matchup_id),
                team,
                result,
                values,
            });
        }
    }

    // Numbered keys sort as strings ("10" < "2"), so restore numeric order.
    records.sort_by_key(|r| r.matchup_id);

    Ok(records)
}

fn parse_team(
    parts: Vec<TeamPart>,
    week: u32,
    categories: &CategoryTable,
    team_name_mapping: &BTreeMap<String, String>,
) -> Result<(Team, BTreeMap<String, f64>)> {
    let mut key = None;
    let mut id = None;
    let mut name = None;
    let mut stats = None;

    for part in parts {
        match part {
            TeamPart::Info(items) => {
                for item in items {
                    match item {
                        TeamInfoItem::Key { team_key } => key = Some(team_key),
                        TeamInfoItem::Id { team_id } => id = Some(team_id),
                        TeamInfoItem::Name { name: n } => name = Some(n),
                        TeamInfoItem::Other(_) => {}
                    }
                }
            }
            TeamPart::Stats { team_stats } => stats = Some(team_stats),
            TeamPart::Other(_) => {}
        }
    }

    let key = key.ok_or_else(|| malformed(format!("team without team_key in week {}", week)))?;
    let raw_name = name.ok_or_else(|| malformed(format!("team {} has no name", key)))?;
    let stats = stats.ok_or_else(|| malformed(format!("team {} has no team_stats", key)))?;

    let mut values = BTreeMap::new();
    for entry in stats.stats {
        let Some(category) = categories.by_stat_id(&entry.stat.stat_id) else {
            continue;
        };

        let value = match &entry.stat.value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => {
                parse_stat_value(s).map_err(|InvalidStatValue(raw)| {
                    StandingsError::InvalidCategoryValue {
                        team_key: key.clone(),
                        week,
                        category: category.name.clone(),
                        raw,
                    }
                })?
            }
            other => {
                return Err(StandingsError::InvalidCategoryValue {
                    team_key: key.clone(),
                    week,
                    category: category.name.clone(),
                    raw: other.to_string(),
                })
            }
        };

        if let Some(v) = value {
            values.insert(category.name.clone(), v);
        }
    }

    let team = Team {
        id: id.unwrap_or_default(),
        name: sanitize_team_name(&raw_name, team_name_mapping),
        key,
    };

    Ok((team, values))
}

// week_<n>.json files in a directory, by week number.
pub fn scoreboard_files(dir: &Path) -> Result<Vec<(u32, PathBuf)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let week = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("week_"))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|n| n.parse::<u32>().ok());

        if let Some(week) = week {
            files.push((week, path));
        }
    }

    files.sort();
    Ok(files)
}

// Weeks at or past `current_week` are still in progress and left out.
pub fn load_scoreboards(
    dir: &Path,
    current_week: Option<u32>,
    categories: &CategoryTable,
    team_name_mapping: &BTreeMap<String, String>,
) -> Result<Vec<TeamWeekRecord>> {
    let mut records = Vec::new();

    for (week, path) in scoreboard_files(dir)? {
        if current_week.is_some_and(|cw| week >= cw) {
            continue;
        }
        info!("Processing week {}", week);
        let json = fs::read_to_string(&path)?;
        records.extend(parse_week(&json, week, categories, team_name_mapping)?);
    }

    info!("Extracted {} stat records", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn table() -> CategoryTable {
        CategoryTable::new(vec![
            Category::new("R", crate::category::Direction::HigherIsBetter, Some("7")),
            Category::new("ERA", crate::category::Direction::LowerIsBetter, Some("26")),
            Category::higher("NOID"),
        ])
        .unwrap()
    }

    fn team_json(key: &str, id: &str, name: &str, runs: &str, era: &str) -> String {
        format!(
            r#"{{"team": [
                [{{"team_key": "{key}"}}, {{"team_id": "{id}"}}, {{"name": "{name}"}}, [], {{"url": "x"}}],
                {{"team_stats": {{"coverage_type": "week", "week": "3", "stats": [
                    {{"stat": {{"stat_id": "60", "value": "45/180"}}}},
                    {{"stat": {{"stat_id": "7", "value": "{runs}"}}}},
                    {{"stat": {{"stat_id": "26", "value": "{era}"}}}}
                ]}}, "team_points": {{"total": "7"}}}}
            ]}}"#
        )
    }

    fn document(winner: Option<&str>, tied: u8) -> String {
        let winner = winner
            .map(|w| format!(r#""winner_team_key": "{w}","#))
            .unwrap_or_default();
        format!(
            r#"{{"fantasy_content": {{"league": [
                {{"league_key": "431.l.1", "name": "League"}},
                {{"scoreboard": {{"week": "3", "0": {{"matchups": {{
                    "0": {{"matchup": {{"week": "3", "status": "postevent", "is_tied": {tied}, {winner}
                        "0": {{"teams": {{
                            "0": {a},
                            "1": {b},
                            "count": 2
                        }}}}
                    }}}},
                    "count": 1
                }}}}}}}}
            ]}}}}"#,
            a = team_json("431.l.1.t.1", "1", "Raw One", "30", "3.50"),
            b = team_json("431.l.1.t.2", "2", "Two", "25", "-"),
        )
    }

    #[test]
    fn parses_records_from_nested_document() {
        let mut mapping = BTreeMap::new();
        mapping.insert("Raw One".to_string(), "One".to_string());

        let records = parse_week(&document(Some("431.l.1.t.1"), 0), 3, &table(), &mapping).unwrap();
        assert_eq!(records.len(), 2);

        let one = &records[0];
        assert_eq!(one.week, 3);
        assert_eq!(one.matchup_id, Some(0));
        assert_eq!(one.team.key, "431.l.1.t.1");
        assert_eq!(one.team.id, "1");
        assert_eq!(one.team.name, "One");
        assert_eq!(one.result, MatchResult::Win);
        assert_eq!(one.values["R"], 30.0);
        assert_eq!(one.values["ERA"], 3.5);
        assert!(!one.values.contains_key("NOID"));

        let two = &records[1];
        assert_eq!(two.result, MatchResult::Loss);
        assert!(!two.values.contains_key("ERA"));
    }

    #[test]
    fn no_winner_or_tied_flag_is_a_tie() {
        let records = parse_week(&document(None, 0), 3, &table(), &BTreeMap::new()).unwrap();
        assert!(records.iter().all(|r| r.result == MatchResult::Tie));

        let records =
            parse_week(&document(Some("431.l.1.t.1"), 1), 3, &table(), &BTreeMap::new()).unwrap();
        assert!(records.iter().all(|r| r.result == MatchResult::Tie));
    }

    #[test]
    fn document_week_overrides_requested_week() {
        let records = parse_week(&document(None, 0), 9, &table(), &BTreeMap::new()).unwrap();
        assert!(records.iter().all(|r| r.week == 3));
    }

    #[test]
    fn missing_scoreboard_is_malformed() {
        let json = r#"{"fantasy_content": {"league": [{"league_key": "431.l.1"}]}}"#;
        assert!(matches!(
            parse_week(json, 1, &table(), &BTreeMap::new()),
            Err(StandingsError::MalformedScoreboard { .. })
        ));
    }

    #[test]
    fn broken_scoreboard_reports_the_real_error() {
        let json = r#"{"fantasy_content": {"league": [
            {"league_key": "431.l.1"},
            {"scoreboard": {"week": "3", "0": {"matchup_list": {}}}}
        ]}}"#;

        match parse_week(json, 3, &table(), &BTreeMap::new()) {
            Err(StandingsError::MalformedScoreboard { reason }) => {
                assert!(reason.contains("matchups"), "{}", reason);
                assert!(!reason.contains("no scoreboard"), "{}", reason);
            }
            other => panic!("expected a malformed scoreboard, got {:?}", other),
        }
    }

    #[test]
    fn scoreboard_files_are_ordered_by_week_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for week in [10, 2, 1] {
            fs::write(dir.path().join(format!("week_{week}.json")), document(None, 0)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let weeks: Vec<u32> = scoreboard_files(dir.path())
            .unwrap()
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(weeks, vec![1, 2, 10]);

        let records = load_scoreboards(dir.path(), Some(2), &table(), &BTreeMap::new()).unwrap();
        assert_eq!(records.len(), 2);
    }
}
