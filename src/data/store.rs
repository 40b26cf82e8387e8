//! Feature store: turns the raw team table into fold-indexed team seasons

use super::config::DataConfig;
use super::team_season::{SeasonTable, TeamSeason, SEED_LINES, TEAMS_PER_LINE};
use crate::error::{BracketError, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Largest number of teams that may share a seed line (four regions plus a play-in pair)
pub const MAX_TEAMS_PER_LINE: usize = TEAMS_PER_LINE + 2;

/// Rotation index of a season.
///
/// Seasons before `first_season` and the cancelled season have no fold.
/// Seasons after the cancelled one shift down by one so indices stay contiguous.
pub fn fold_index(season: i32, first_season: i32, cancelled_season: i32) -> Option<usize> {
    if season < first_season || season == cancelled_season {
        return None;
    }
    let offset = if season < cancelled_season {
        season - first_season + 1
    } else {
        season - first_season
    };
    usize::try_from(offset).ok().filter(|&f| f > 0)
}

/// Loads and filters team seasons
pub struct FeatureStore {
    config: DataConfig,
}

impl FeatureStore {
    pub fn new(config: DataConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Filter the raw table to eligible team seasons with a fold index.
    ///
    /// Only the configured predictors survive; every other column of the raw
    /// table (historical ranks, ids, bookkeeping labels) is dropped.
    pub fn load_and_filter(&self, raw: &DataFrame) -> Result<SeasonTable> {
        self.check_required_columns(raw)?;

        let cols = &self.config.columns;
        let teams = string_column(raw, &cols.team)?;
        let seasons = float_column(raw, &cols.season)?;
        let eligible = float_column(raw, &cols.eligible)?;
        let made = float_column(raw, &cols.made_tournament)?;
        let seeds = float_column(raw, &cols.seed)?;
        let conference = string_column(raw, &self.config.conference_result_column)?;

        let numeric_names = self.config.numeric_columns();
        let categorical_names = self.config.categorical_columns();
        let numeric: Vec<Vec<Option<f64>>> = numeric_names
            .iter()
            .map(|name| float_column(raw, name))
            .collect::<Result<_>>()?;
        let categorical: Vec<Vec<Option<String>>> = categorical_names
            .iter()
            .map(|name| string_column(raw, name))
            .collect::<Result<_>>()?;

        let mut rows = Vec::new();
        let mut seen: BTreeSet<(i32, String)> = BTreeSet::new();
        let mut dropped_ineligible = 0usize;
        let mut dropped_season = 0usize;

        for i in 0..raw.height() {
            let team = teams[i].clone().ok_or_else(|| {
                BracketError::DataError(format!("row {}: missing team name", i))
            })?;
            let season = seasons[i].ok_or_else(|| {
                BracketError::DataError(format!("row {} ({}): missing season", i, team))
            })? as i32;

            match eligible[i] {
                Some(v) if v >= 0.5 => {}
                Some(_) => {
                    dropped_ineligible += 1;
                    continue;
                }
                None => {
                    warn!(team = %team, season, "Missing eligibility flag, treating as ineligible");
                    dropped_ineligible += 1;
                    continue;
                }
            }

            if season == self.config.cancelled_season {
                warn!(team = %team, season, "Dropping row from cancelled season");
                dropped_season += 1;
                continue;
            }

            let fold = match fold_index(season, self.config.first_season, self.config.cancelled_season) {
                Some(fold) => fold,
                None => {
                    dropped_season += 1;
                    continue;
                }
            };

            let made_tournament = made[i].ok_or_else(|| {
                BracketError::DataError(format!("{} {}: missing selection label", team, season))
            })? >= 0.5;

            let seed = match seeds[i] {
                Some(value) => Some(parse_seed(value, &team, season)?),
                None => None,
            };

            if made_tournament != seed.is_some() {
                warn!(
                    team = %team,
                    season,
                    made_tournament,
                    seed = ?seed,
                    "Selection label and seed disagree"
                );
            }

            let conference_champion = conference[i]
                .as_deref()
                .map_or(false, |v| v == self.config.champion_label);

            if !seen.insert((season, team.clone())) {
                return Err(BracketError::ValidationError(format!(
                    "{} appears twice in season {}",
                    team, season
                )));
            }

            rows.push(TeamSeason {
                team,
                season,
                fold,
                numeric: numeric.iter().map(|col| col[i]).collect(),
                categorical: categorical.iter().map(|col| col[i].clone()).collect(),
                made_tournament,
                seed,
                conference_champion,
            });
        }

        self.check_seed_invariants(&rows)?;

        let table = SeasonTable::new(numeric_names, categorical_names, rows)?;
        info!(
            rows_in = raw.height(),
            kept = table.len(),
            dropped_ineligible,
            dropped_season,
            seasons = ?table.seasons(),
            "Feature store loaded"
        );

        Ok(table)
    }

    fn check_required_columns(&self, raw: &DataFrame) -> Result<()> {
        let present: Vec<String> = raw
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        for required in self.config.required_columns() {
            if !present.contains(&required) {
                return Err(BracketError::ColumnNotFound(required));
            }
        }
        Ok(())
    }

    fn check_seed_invariants(&self, rows: &[TeamSeason]) -> Result<()> {
        let mut per_season: BTreeMap<i32, BTreeMap<u8, usize>> = BTreeMap::new();
        for row in rows {
            if let Some(seed) = row.seed {
                *per_season
                    .entry(row.season)
                    .or_default()
                    .entry(seed)
                    .or_insert(0) += 1;
            }
        }

        for (season, lines) in &per_season {
            let seeded: usize = lines.values().sum();
            if seeded > self.config.field_size {
                return Err(BracketError::ValidationError(format!(
                    "season {} seeds {} teams, field size is {}",
                    season, seeded, self.config.field_size
                )));
            }
            for (seed, count) in lines {
                if *count > MAX_TEAMS_PER_LINE {
                    return Err(BracketError::ValidationError(format!(
                        "season {} has {} teams on seed line {}",
                        season, count, seed
                    )));
                }
            }
            debug!(season = *season, seeded, "Seed lines validated");
        }
        Ok(())
    }
}

fn parse_seed(value: f64, team: &str, season: i32) -> Result<u8> {
    if value.fract() != 0.0 || value < 1.0 || value > f64::from(SEED_LINES) {
        return Err(BracketError::ValidationError(format!(
            "{} {}: seed {} is not an integer in 1..={}",
            team, season, value, SEED_LINES
        )));
    }
    Ok(value as u8)
}

/// Read a column as nullable f64, casting booleans and integers
pub(crate) fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| BracketError::ColumnNotFound(name.to_string()))?;
    let cast = column
        .cast(&DataType::Float64)
        .map_err(|e| BracketError::DataError(format!("column '{}': {}", name, e)))?;
    let values = cast
        .as_materialized_series()
        .f64()
        .map_err(|e| BracketError::DataError(e.to_string()))?
        .into_iter()
        .collect();
    Ok(values)
}

/// Read a column as nullable strings, casting numeric codes
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| BracketError::ColumnNotFound(name.to_string()))?;
    let cast = column
        .cast(&DataType::String)
        .map_err(|e| BracketError::DataError(format!("column '{}': {}", name, e)))?;
    let values = cast
        .as_materialized_series()
        .str()
        .map_err(|e| BracketError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::config::PredictorSpec;

    fn small_config() -> DataConfig {
        DataConfig::default()
            .with_numeric_predictors(vec![PredictorSpec::new("net", "NET rank")])
            .with_categorical_predictors(vec![PredictorSpec::new("conf_tourney", "Conference result")])
    }

    fn raw() -> DataFrame {
        df!(
            "team" => &["A", "B", "C", "D", "E", "F"],
            "season" => &[2016i64, 2017, 2019, 2020, 2021, 2024],
            "eligible" => &[true, true, false, true, true, true],
            "made_tournament" => &[1i64, 1, 0, 0, 1, 0],
            "seed" => &[Some(3.0), Some(1.0), None, None, Some(16.0), None],
            "net" => &[Some(10.0), Some(2.0), Some(80.0), Some(50.0), None, Some(120.0)],
            "conf_tourney" => &["runner_up", "champion", "early_exit", "early_exit", "champion", "early_exit"],
            "historical_rank" => &[1i64, 2, 3, 4, 5, 6]
        )
        .unwrap()
    }

    #[test]
    fn test_fold_index_skips_cancelled_season() {
        let folds: Vec<Option<usize>> = [2016, 2017, 2018, 2019, 2020, 2021, 2022, 2023, 2024]
            .iter()
            .map(|&s| fold_index(s, 2017, 2020))
            .collect();
        assert_eq!(
            folds,
            vec![None, Some(1), Some(2), Some(3), None, Some(4), Some(5), Some(6), Some(7)]
        );
    }

    #[test]
    fn test_load_and_filter_drops_rows() {
        let store = FeatureStore::new(small_config());
        let table = store.load_and_filter(&raw()).unwrap();

        let teams: Vec<&str> = table.rows().iter().map(|r| r.team.as_str()).collect();
        // A: 2016, C: ineligible, D: cancelled season
        assert_eq!(teams, vec!["B", "E", "F"]);
        assert_eq!(table.rows()[0].fold, 1);
        assert_eq!(table.rows()[1].fold, 4);
        assert_eq!(table.rows()[2].fold, 7);
        assert!(table.rows()[1].conference_champion);
        assert_eq!(table.rows()[1].numeric, vec![None]);
        assert_eq!(table.numeric_columns(), &["net".to_string()]);
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let store = FeatureStore::new(small_config());
        let df = raw().drop("net").unwrap();
        let result = store.load_and_filter(&df);
        assert!(matches!(result, Err(BracketError::ColumnNotFound(c)) if c == "net"));
    }

    #[test]
    fn test_duplicate_team_season_rejected() {
        let store = FeatureStore::new(small_config());
        let df = df!(
            "team" => &["A", "A"],
            "season" => &[2018i64, 2018],
            "eligible" => &[1i64, 1],
            "made_tournament" => &[0i64, 0],
            "seed" => &[None::<f64>, None],
            "net" => &[5.0, 6.0],
            "conf_tourney" => &["early_exit", "early_exit"]
        )
        .unwrap();
        assert!(matches!(
            store.load_and_filter(&df),
            Err(BracketError::ValidationError(_))
        ));
    }

    #[test]
    fn test_fractional_seed_rejected() {
        let store = FeatureStore::new(small_config());
        let df = df!(
            "team" => &["A"],
            "season" => &[2018i64],
            "eligible" => &[1i64],
            "made_tournament" => &[1i64],
            "seed" => &[2.5],
            "net" => &[5.0],
            "conf_tourney" => &["champion"]
        )
        .unwrap();
        assert!(matches!(
            store.load_and_filter(&df),
            Err(BracketError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_eligibility_drops_row() {
        let store = FeatureStore::new(small_config());
        let df = df!(
            "team" => &["A", "B"],
            "season" => &[2018i64, 2018],
            "eligible" => &[None, Some(1i64)],
            "made_tournament" => &[0i64, 0],
            "seed" => &[None::<f64>, None],
            "net" => &[5.0, 6.0],
            "conf_tourney" => &["early_exit", "early_exit"]
        )
        .unwrap();
        let table = store.load_and_filter(&df).unwrap();
        let teams: Vec<&str> = table.rows().iter().map(|r| r.team.as_str()).collect();
        assert_eq!(teams, vec!["B"]);
    }
}
