//! Bracketology - tournament selection and seeding prediction
//!
//! Predicts which teams a selection committee puts in the field and which
//! seed line each gets, from the resume metrics the committee says it uses.
//! Every season is predicted by models that never saw it.
//!
//! # Modules
//!
//! - [`data`] - Team-season feature store and game results
//! - [`preprocessing`] - Standardisation and one-hot encoding recipe
//! - [`training`] - Gradient-boosted trees, stratified CV, depth tuning
//! - [`pipeline`] - Season rotation, selection and seeding stages
//! - [`evaluation`] - Accuracy, seed error and tournament comparison
//! - [`report`] - Console tables and file artefacts
//! - [`cli`] - Command-line interface

pub mod error;

pub mod data;
pub mod preprocessing;
pub mod training;

pub mod pipeline;
pub mod evaluation;
pub mod report;

pub mod cli;

pub use error::{BracketError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{BracketError, Result};

    pub use crate::data::{load_games, DataConfig, DataLoader, FeatureStore, GameResult, SeasonTable, TeamSeason};

    pub use crate::preprocessing::Recipe;

    pub use crate::training::{FitTask, FittedModel, Learner, Metric, TaskMode, Tuner, TuningConfig};

    pub use crate::pipeline::{
        assign_seeds, Pipeline, PipelineConfig, PipelineOutput, PlayInRole, PredictionRecord, PredictionSet,
        Ranker, Selector,
    };

    pub use crate::evaluation::{evaluate, Evaluation};

    pub use crate::report::{print_report, write_artifacts};
}
