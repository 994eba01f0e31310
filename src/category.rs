use serde::*;
use std::cmp::Ordering;

use crate::error::{Result, StandingsError};

// Which way a category sorts. Fixed per category for the whole run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

impl Direction {
    // Orders two values so that the better one comes first.
    pub fn best_first(&self, a: f64, b: f64) -> Ordering {
        match self {
            Direction::HigherIsBetter => b.total_cmp(&a),
            Direction::LowerIsBetter => a.total_cmp(&b),
        }
    }

    pub fn is_better(&self, candidate: f64, current: f64) -> bool {
        self.best_first(candidate, current) == Ordering::Less
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub direction: Direction,
    // Provider stat id, used when reading saved scoreboards
    #[serde(default)]
    pub stat_id: Option<String>,
}

impl Category {
    pub fn new(name: &str, direction: Direction, stat_id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            direction,
            stat_id: stat_id.map(str::to_string),
        }
    }

    pub fn higher(name: &str) -> Self {
        Self::new(name, Direction::HigherIsBetter, None)
    }

    pub fn lower(name: &str) -> Self {
        Self::new(name, Direction::LowerIsBetter, None)
    }
}

// The default league categories: name, direction, provider stat id.
pub fn default_categories() -> Vec<Category> {
    use Direction::*;
    [
        ("R", HigherIsBetter, "7"),
        ("HR", HigherIsBetter, "12"),
        ("RBI", HigherIsBetter, "13"),
        ("SB", HigherIsBetter, "16"),
        ("TB", HigherIsBetter, "23"),
        ("AVG", HigherIsBetter, "3"),
        ("OBP", HigherIsBetter, "4"),
        ("IP", HigherIsBetter, "50"),
        ("K", HigherIsBetter, "42"),
        ("ERA", LowerIsBetter, "26"),
        ("WHIP", LowerIsBetter, "27"),
        ("SV", HigherIsBetter, "89"),
    ]
    .into_iter()
    .map(|(name, direction, id)| Category::new(name, direction, Some(id)))
    .collect()
}

/// Immutable, ordered set of categories handed to every component that needs
/// a direction. Order is the column order used in every report.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.is_empty() {
            return Err(StandingsError::Configuration {
                message: "at least one category is required".to_string(),
            });
        }

        for (idx, c) in categories.iter().enumerate() {
            if c.name.trim().is_empty() {
                return Err(StandingsError::Configuration {
                    message: format!("category #{} has an empty name", idx + 1),
                });
            }
            if categories[..idx].iter().any(|other| other.name == c.name) {
                return Err(StandingsError::Configuration {
                    message: format!("category {} is listed twice", c.name),
                });
            }
        }

        Ok(Self { categories })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| StandingsError::UnknownCategory { name: name.to_string() })
    }

    pub fn by_stat_id(&self, stat_id: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.stat_id.as_deref() == Some(stat_id))
    }
}

impl<'a> IntoIterator for &'a CategoryTable {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}
