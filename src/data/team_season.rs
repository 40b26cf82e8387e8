//! Team-season records and the filtered season table

use crate::error::{BracketError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical frame column names used after loading
pub const TEAM: &str = "team";
pub const SEASON: &str = "season";
pub const FOLD: &str = "fold";
pub const MADE_TOURNAMENT: &str = "made_tournament";
pub const SEED: &str = "seed";

/// Bookkeeping columns that never enter a design matrix as predictors
pub const BOOKKEEPING: [&str; 5] = [TEAM, SEASON, FOLD, MADE_TOURNAMENT, SEED];

/// Number of seed lines in the bracket
pub const SEED_LINES: u8 = 16;

/// Teams per seed line before play-in adjustments
pub const TEAMS_PER_LINE: usize = 4;

/// One university in one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeason {
    pub team: String,
    pub season: i32,
    /// Rotation index derived from the season, 1-based and contiguous
    pub fold: usize,
    /// Numeric predictors, aligned with [`SeasonTable::numeric_columns`]
    pub numeric: Vec<Option<f64>>,
    /// Categorical predictors, aligned with [`SeasonTable::categorical_columns`]
    pub categorical: Vec<Option<String>>,
    pub made_tournament: bool,
    pub seed: Option<u8>,
    /// Automatic bid through the conference tournament
    pub conference_champion: bool,
}

/// The filtered, fold-indexed team table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonTable {
    numeric_columns: Vec<String>,
    categorical_columns: Vec<String>,
    rows: Vec<TeamSeason>,
}

impl SeasonTable {
    /// Build a table, checking that every row matches the predictor layout
    pub fn new(
        numeric_columns: Vec<String>,
        categorical_columns: Vec<String>,
        rows: Vec<TeamSeason>,
    ) -> Result<Self> {
        for name in numeric_columns.iter().chain(categorical_columns.iter()) {
            if BOOKKEEPING.contains(&name.as_str()) {
                return Err(BracketError::ConfigError(format!(
                    "predictor '{}' collides with a bookkeeping column",
                    name
                )));
            }
        }

        for row in &rows {
            if row.numeric.len() != numeric_columns.len()
                || row.categorical.len() != categorical_columns.len()
            {
                return Err(BracketError::ShapeError {
                    expected: format!(
                        "{} numeric / {} categorical predictors",
                        numeric_columns.len(),
                        categorical_columns.len()
                    ),
                    actual: format!(
                        "{} numeric / {} categorical for {} {}",
                        row.numeric.len(),
                        row.categorical.len(),
                        row.team,
                        row.season
                    ),
                });
            }
        }

        Ok(Self {
            numeric_columns,
            categorical_columns,
            rows,
        })
    }

    pub fn rows(&self) -> &[TeamSeason] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric_columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical_columns
    }

    /// Distinct seasons, ascending
    pub fn seasons(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|r| r.season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows of one season
    pub fn season_rows(&self, season: i32) -> Vec<&TeamSeason> {
        self.rows.iter().filter(|r| r.season == season).collect()
    }

    /// Render a subset of rows as a data frame with canonical column names.
    ///
    /// Bookkeeping columns come first, followed by the numeric and then the
    /// categorical predictors. Missing values stay null.
    pub fn frame(&self, rows: &[&TeamSeason]) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(
            BOOKKEEPING.len() + self.numeric_columns.len() + self.categorical_columns.len(),
        );

        let teams: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
        let seasons: Vec<i32> = rows.iter().map(|r| r.season).collect();
        let folds: Vec<i64> = rows.iter().map(|r| r.fold as i64).collect();
        let made: Vec<f64> = rows
            .iter()
            .map(|r| if r.made_tournament { 1.0 } else { 0.0 })
            .collect();
        let seeds: Vec<Option<f64>> = rows.iter().map(|r| r.seed.map(f64::from)).collect();

        columns.push(Series::new(TEAM.into(), teams).into());
        columns.push(Series::new(SEASON.into(), seasons).into());
        columns.push(Series::new(FOLD.into(), folds).into());
        columns.push(Series::new(MADE_TOURNAMENT.into(), made).into());
        columns.push(Series::new(SEED.into(), seeds).into());

        for (j, name) in self.numeric_columns.iter().enumerate() {
            let values: Vec<Option<f64>> = rows.iter().map(|r| r.numeric[j]).collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }

        for (j, name) in self.categorical_columns.iter().enumerate() {
            let values: Vec<Option<&str>> =
                rows.iter().map(|r| r.categorical[j].as_deref()).collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }

        DataFrame::new(columns).map_err(|e| BracketError::DataError(e.to_string()))
    }
}
