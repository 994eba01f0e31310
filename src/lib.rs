//! Fantasy league standings with expected points.
//!
//! Every week each category is ranked across the whole league instead of
//! against one opponent; summing those ranks gives a table that can be set
//! against the real standings to expose schedule luck.

pub mod analysis;
pub mod category;
pub mod data_loader;
pub mod error;
pub mod league;
pub mod leaders;
pub mod ranking;
pub mod ranking_context;
pub mod report;
pub mod scoreboard;
pub mod standings;
pub mod util;

pub use category::{Category, CategoryTable, Direction};
pub use error::{Result, StandingsError};
pub use ranking_context::RankingContext;
