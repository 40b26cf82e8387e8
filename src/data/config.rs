//! Feature store configuration

use serde::{Deserialize, Serialize};

/// A numeric predictor column and the glossary text shown in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorSpec {
    pub column: String,
    pub description: String,
}

impl PredictorSpec {
    pub fn new(column: &str, description: &str) -> Self {
        Self {
            column: column.to_string(),
            description: description.to_string(),
        }
    }
}

/// Names of the bookkeeping columns in the team table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    /// University name
    pub team: String,
    /// Season year
    pub season: String,
    /// Postseason eligibility flag (boolean or 0/1)
    pub eligible: String,
    /// Committee selection label (boolean or 0/1)
    pub made_tournament: String,
    /// Committee seed, null when not selected
    pub seed: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            team: "team".to_string(),
            season: "season".to_string(),
            eligible: "eligible".to_string(),
            made_tournament: "made_tournament".to_string(),
            seed: "seed".to_string(),
        }
    }
}

/// Names of the columns in the game results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameColumns {
    pub season: String,
    pub team_1: String,
    pub team_2: String,
    /// 1 (or true) when `team_1` won the game
    pub team_1_won: String,
}

impl Default for GameColumns {
    fn default() -> Self {
        Self {
            season: "season".to_string(),
            team_1: "team_1".to_string(),
            team_2: "team_2".to_string(),
            team_1_won: "team_1_won".to_string(),
        }
    }
}

/// Configuration of the feature store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Bookkeeping columns of the team table
    pub columns: ColumnMap,
    /// Columns of the game results table
    pub game_columns: GameColumns,
    /// Numeric predictors disclosed as committee-usable
    pub numeric_predictors: Vec<PredictorSpec>,
    /// Categorical predictors (one-hot encoded downstream)
    pub categorical_predictors: Vec<PredictorSpec>,
    /// Categorical column holding the conference tournament result
    pub conference_result_column: String,
    /// Level of `conference_result_column` that marks an automatic bid
    pub champion_label: String,
    /// First season kept; everything earlier is dropped
    pub first_season: i32,
    /// Season without a tournament; its rows are dropped and folds stay contiguous
    pub cancelled_season: i32,
    /// Number of teams selected per season
    pub field_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            game_columns: GameColumns::default(),
            numeric_predictors: vec![
                PredictorSpec::new("win_pct", "Winning percentage over the regular season"),
                PredictorSpec::new("sos", "Strength of schedule rank"),
                PredictorSpec::new("nc_sos", "Non-conference strength of schedule rank"),
                PredictorSpec::new("sor", "Strength of record rank (resume)"),
                PredictorSpec::new("kpi", "KPI rank (resume)"),
                PredictorSpec::new("net", "NET rank (committee sorting tool)"),
                PredictorSpec::new("bpi", "BPI rank (predictive)"),
                PredictorSpec::new("kenpom", "KenPom adjusted efficiency rank (predictive)"),
                PredictorSpec::new("q1_wins", "Quadrant 1 wins"),
                PredictorSpec::new("q1_losses", "Quadrant 1 losses"),
                PredictorSpec::new("q2_wins", "Quadrant 2 wins"),
                PredictorSpec::new("q34_losses", "Quadrant 3 and 4 losses"),
            ],
            categorical_predictors: vec![
                PredictorSpec::new("conf_tourney", "Conference tournament result"),
                PredictorSpec::new("prev_tourney", "Previous season tournament result"),
            ],
            conference_result_column: "conf_tourney".to_string(),
            champion_label: "champion".to_string(),
            first_season: 2017,
            cancelled_season: 2020,
            field_size: 68,
        }
    }
}

impl DataConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the numeric predictors
    pub fn with_numeric_predictors(mut self, predictors: Vec<PredictorSpec>) -> Self {
        self.numeric_predictors = predictors;
        self
    }

    /// Replace the categorical predictors
    pub fn with_categorical_predictors(mut self, predictors: Vec<PredictorSpec>) -> Self {
        self.categorical_predictors = predictors;
        self
    }

    /// Set the number of teams selected per season
    pub fn with_field_size(mut self, field_size: usize) -> Self {
        self.field_size = field_size;
        self
    }

    /// Names of the numeric predictor columns, in declaration order
    pub fn numeric_columns(&self) -> Vec<String> {
        self.numeric_predictors.iter().map(|p| p.column.clone()).collect()
    }

    /// Names of the categorical predictor columns, in declaration order
    pub fn categorical_columns(&self) -> Vec<String> {
        self.categorical_predictors.iter().map(|p| p.column.clone()).collect()
    }

    /// Every column the team table must carry
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols = vec![
            self.columns.team.clone(),
            self.columns.season.clone(),
            self.columns.eligible.clone(),
            self.columns.made_tournament.clone(),
            self.columns.seed.clone(),
        ];
        cols.extend(self.numeric_columns());
        cols.extend(self.categorical_columns());
        if !cols.contains(&self.conference_result_column) {
            cols.push(self.conference_result_column.clone());
        }
        cols
    }
}
