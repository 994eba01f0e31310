// Run configuration. Defaults cover the standard league; a TOML file or the
// environment can override any of it.

use chrono::Datelike;
use serde::*;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::category::{default_categories, Category, CategoryTable};
use crate::error::{Result, StandingsError};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RankingContext {
    pub season: i32,
    pub data_dir: PathBuf,
    pub log_level: String,

    pub categories: Vec<Category>,

    // Raw display name => canonical display name
    pub team_name_mapping: BTreeMap<String, String>,
}

impl Default for RankingContext {
    fn default() -> Self {
        Self {
            season: chrono::Local::now().year(),
            data_dir: PathBuf::from("public/data"),
            log_level: "info".to_string(),

            categories: default_categories(),

            team_name_mapping: BTreeMap::new(),
        }
    }
}

impl RankingContext {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let context: RankingContext = toml::from_str(&data)?;
        context.validate()?;
        Ok(context)
    }

    // Defaults with SEASON, DATA_DIR, LOG_LEVEL and TEAM_NAME_MAPPING applied.
    pub fn from_env() -> Result<Self> {
        let mut context = Self::default();
        context.apply_env()?;
        context.validate()?;
        Ok(context)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| env::var(name).ok())
    }

    // Overrides from any variable source; `apply_env` passes the process
    // environment.
    pub fn apply_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(season) = var("SEASON") {
            self.season = season.parse().map_err(|_| StandingsError::Configuration {
                message: format!("invalid SEASON value: {}", season),
            })?;
        }
        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(mapping) = var("TEAM_NAME_MAPPING") {
            self.team_name_mapping.extend(parse_name_mapping(&mapping));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        CategoryTable::new(self.categories.clone())?;

        for (raw, canonical) in &self.team_name_mapping {
            if raw != canonical && self.team_name_mapping.contains_key(canonical) {
                return Err(StandingsError::Configuration {
                    message: format!(
                        "team name mapping chains {:?} -> {:?} -> {:?}",
                        raw, canonical, self.team_name_mapping[canonical]
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn category_table(&self) -> Result<CategoryTable> {
        CategoryTable::new(self.categories.clone())
    }

    pub fn stats_file(&self) -> PathBuf {
        self.data_dir.join(format!("stats_{}.csv", self.season))
    }

    pub fn standings_file(&self) -> PathBuf {
        self.data_dir.join(format!("standings_{}.csv", self.season))
    }

    pub fn leaders_file(&self) -> PathBuf {
        self.data_dir.join(format!("leaders_{}.csv", self.season))
    }
}

// A broken mapping is not fatal: warn and carry on without it.
pub fn parse_name_mapping(json: &str) -> BTreeMap<String, String> {
    match serde_json::from_str(json) {
        Ok(mapping) => mapping,
        Err(e) => {
            warn!("Invalid team name mapping JSON, using empty mapping: {}", e);
            BTreeMap::new()
        }
    }
}
