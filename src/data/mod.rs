//! Feature store
//!
//! Loads the per-team-per-season table, keeps committee-usable predictors,
//! and derives the season rotation index. Also parses tournament game results.

mod config;
pub mod games;
pub mod loader;
pub mod store;
pub mod team_season;

pub use config::{ColumnMap, DataConfig, GameColumns, PredictorSpec};
pub use games::{load_games, validate_games, GameResult};
pub use loader::{DataLoader, DataSaver};
pub use store::{fold_index, FeatureStore};
pub use team_season::{SeasonTable, TeamSeason, SEED_LINES, TEAMS_PER_LINE};
