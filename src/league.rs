// Live league standings as saved from the provider: the first incomplete
// week plus one row per team.

use serde::*;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, StandingsError};

#[derive(Deserialize, Debug)]
struct JsonSnapshot {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    current_week: u32,
    standings: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub team_key: String,
    pub rank: Option<u32>,

    // Every other descriptive field, nested objects flattened one level
    // (outcome_totals.wins => wins). Scalars only; arrays are dropped.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeagueSnapshot {
    pub current_week: u32,
    pub standings: Vec<StandingsRow>,
}

impl LeagueSnapshot {
    pub fn load(file_path: &Path) -> Result<Self> {
        let data = fs::read_to_string(file_path)?;
        let snapshot = Self::from_json(&data)?;
        info!(
            "Retrieved standings for {} teams, current week {}",
            snapshot.standings.len(),
            snapshot.current_week
        );
        Ok(snapshot)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let json: JsonSnapshot = serde_json::from_str(data)?;

        if json.current_week == 0 {
            return Err(StandingsError::Configuration {
                message: "current_week is 1-based, got 0".to_string(),
            });
        }

        let standings = json
            .standings
            .into_iter()
            .enumerate()
            .map(|(idx, row)| StandingsRow::from_object(row, idx))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            current_week: json.current_week,
            standings,
        })
    }

    pub fn row(&self, team_key: &str) -> Option<&StandingsRow> {
        self.standings.iter().find(|r| r.team_key == team_key)
    }
}

impl StandingsRow {
    fn from_object(object: serde_json::Map<String, serde_json::Value>, idx: usize) -> Result<Self> {
        let mut fields = BTreeMap::new();
        flatten_into(&mut fields, object);

        let team_key = fields
            .remove("team_key")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StandingsError::MalformedRecord {
                line: idx as u64 + 1,
                reason: "standings entry without team_key".to_string(),
            })?;

        let rank = match fields.remove("rank") {
            None => None,
            Some(raw) if raw.is_empty() => None,
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| StandingsError::MalformedRecord {
                line: idx as u64 + 1,
                reason: format!("rank {:?} for {} is not an integer", raw, team_key),
            })?),
        };

        Ok(Self { team_key, rank, fields })
    }
}

// Outer keys win over flattened inner ones, same as writing the outer dict last.
fn flatten_into(
    fields: &mut BTreeMap<String, String>,
    object: serde_json::Map<String, serde_json::Value>,
) {
    let mut nested = Vec::new();

    for (key, value) in object {
        match value {
            serde_json::Value::Object(inner) => nested.push(inner),
            serde_json::Value::Array(_) => {}
            scalar => {
                fields.insert(key, scalar_to_string(scalar));
            }
        }
    }

    for inner in nested {
        for (key, value) in inner {
            match value {
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {}
                scalar => {
                    fields.entry(key).or_insert_with(|| scalar_to_string(scalar));
                }
            }
        }
    }
}

fn scalar_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "current_week": "4",
        "standings": [
            {"team_key": "431.l.1.t.2", "name": "Two", "rank": "1",
             "outcome_totals": {"wins": "30", "losses": 6, "ties": 0, "percentage": ".833"},
             "games_back": "-", "managers": [{"nickname": "x"}]},
            {"team_key": "431.l.1.t.1", "name": "One", "rank": 2,
             "outcome_totals": {"wins": 6, "losses": 30, "ties": 0, "percentage": ".167"},
             "games_back": "24.0"},
            {"team_key": "431.l.1.t.3", "name": "Three", "rank": ""}
        ]
    }"#;

    #[test]
    fn flattens_rows_and_parses_ranks() {
        let snapshot = LeagueSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.current_week, 4);
        assert_eq!(snapshot.standings.len(), 3);

        let two = snapshot.row("431.l.1.t.2").unwrap();
        assert_eq!(two.rank, Some(1));
        assert_eq!(two.fields["wins"], "30");
        assert_eq!(two.fields["losses"], "6");
        assert_eq!(two.fields["percentage"], ".833");
        assert_eq!(two.fields["name"], "Two");
        assert!(!two.fields.contains_key("managers"));
        assert!(!two.fields.contains_key("rank"));

        assert_eq!(snapshot.row("431.l.1.t.1").unwrap().rank, Some(2));
        assert_eq!(snapshot.row("431.l.1.t.3").unwrap().rank, None);
        assert!(snapshot.row("431.l.1.t.9").is_none());
    }

    #[test]
    fn bad_rows_are_rejected() {
        let no_key = r#"{"current_week": 2, "standings": [{"rank": 1}]}"#;
        assert!(matches!(
            LeagueSnapshot::from_json(no_key),
            Err(StandingsError::MalformedRecord { line: 1, .. })
        ));

        let bad_rank = r#"{"current_week": 2, "standings": [{"team_key": "k", "rank": "first"}]}"#;
        assert!(LeagueSnapshot::from_json(bad_rank).is_err());

        let week_zero = r#"{"current_week": 0, "standings": []}"#;
        assert!(LeagueSnapshot::from_json(week_zero).is_err());
    }
}
