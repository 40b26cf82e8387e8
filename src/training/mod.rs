//! Model fitting
//!
//! - Regression trees with learned missing-value directions
//! - Gradient boosting for squared-error and logistic losses
//! - Stratified k-fold splitting
//! - Depth search and refit ([`Tuner`])

mod config;
mod models;
mod tuning;
pub mod cross_validation;
pub mod decision_tree;
pub mod gradient_boosting;

pub use config::{accuracy, depth_grid, mse, Metric, TaskMode, TuningConfig};
pub use cross_validation::{quantile_type7, CVSplit, CrossValidator, Strata};
pub use decision_tree::{DecisionTree, SortedIndex, TreeNode};
pub use gradient_boosting::{GradientBoosting, GradientBoostingConfig, Loss};
pub use models::{Booster, GradientBoostingLearner, Learner};
pub use tuning::{take_rows, DepthScore, FitTask, FittedModel, Tuner};
