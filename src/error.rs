//! Error types for the expected standings pipeline
//!
//! Ranking and aggregation failures abort the run; nothing is written when a
//! computation step fails.

pub type Result<T> = std::result::Result<T, StandingsError>;

#[derive(Debug, thiserror::Error)]
pub enum StandingsError {
    #[error("team {team_key} has no {category} value in week {week}")]
    MissingCategoryValue {
        team_key: String,
        week: u32,
        category: String,
    },

    #[error("team {team_key} has a non-numeric {category} value {raw:?} in week {week}")]
    InvalidCategoryValue {
        team_key: String,
        week: u32,
        category: String,
        raw: String,
    },

    #[error("team {team_key} has no stat record for completed week {week}")]
    MissingTeamWeek { team_key: String, week: u32 },

    #[error("input table is missing required column {column}")]
    MissingColumn { column: String },

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("malformed scoreboard: {reason}")]
    MalformedScoreboard { reason: String },

    #[error("unknown category: {name}")]
    UnknownCategory { name: String },

    #[error("team {team_key} appears more than once in week {week}")]
    DuplicateRecord { team_key: String, week: u32 },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
