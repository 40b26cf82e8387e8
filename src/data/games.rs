//! Historical tournament game results

use super::config::GameColumns;
use super::store::{float_column, string_column};
use super::team_season::SeasonTable;
use crate::error::{BracketError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One tournament game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub season: i32,
    pub team_1: String,
    pub team_2: String,
    pub team_1_won: bool,
}

impl GameResult {
    pub fn winner(&self) -> &str {
        if self.team_1_won {
            &self.team_1
        } else {
            &self.team_2
        }
    }

    pub fn loser(&self) -> &str {
        if self.team_1_won {
            &self.team_2
        } else {
            &self.team_1
        }
    }
}

/// Parse the game results table. Every cell is required.
pub fn load_games(raw: &DataFrame, columns: &GameColumns) -> Result<Vec<GameResult>> {
    let seasons = float_column(raw, &columns.season)?;
    let team_1 = string_column(raw, &columns.team_1)?;
    let team_2 = string_column(raw, &columns.team_2)?;
    let won = float_column(raw, &columns.team_1_won)?;

    (0..raw.height())
        .map(|i| {
            let missing = |what: &str| BracketError::DataError(format!("game row {}: missing {}", i, what));
            Ok(GameResult {
                season: seasons[i].ok_or_else(|| missing("season"))? as i32,
                team_1: team_1[i].clone().ok_or_else(|| missing("team_1"))?,
                team_2: team_2[i].clone().ok_or_else(|| missing("team_2"))?,
                team_1_won: won[i].ok_or_else(|| missing("winner indicator"))? >= 0.5,
            })
        })
        .collect()
}

/// Check that every game in a modelled season is between two seeded teams
/// of that season. Games from seasons outside the table are ignored.
pub fn validate_games(table: &SeasonTable, games: &[GameResult]) -> Result<()> {
    let seasons: HashSet<i32> = table.rows().iter().map(|r| r.season).collect();
    let seeded: HashSet<(i32, &str)> = table
        .rows()
        .iter()
        .filter(|r| r.seed.is_some())
        .map(|r| (r.season, r.team.as_str()))
        .collect();

    for game in games.iter().filter(|g| seasons.contains(&g.season)) {
        for team in [game.team_1.as_str(), game.team_2.as_str()] {
            if !seeded.contains(&(game.season, team)) {
                return Err(BracketError::DataError(format!(
                    "{} played in {} without a committee seed",
                    team, game.season
                )));
            }
        }
    }
    Ok(())
}
