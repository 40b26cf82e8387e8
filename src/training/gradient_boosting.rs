//! Gradient boosted regression trees
//!
//! One ensemble type serves both stages: squared error for the seed score
//! and logistic loss for the selection probability.

use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use super::config::{TaskMode, TuningConfig};
use super::decision_tree::{DecisionTree, SortedIndex};
use crate::error::{BracketError, Result};

/// Loss minimised by the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loss {
    SquaredError,
    /// Binary log loss on raw margins
    Logistic,
}

impl From<TaskMode> for Loss {
    fn from(mode: TaskMode) -> Self {
        match mode {
            TaskMode::Classification => Loss::Logistic,
            TaskMode::Regression => Loss::SquaredError,
        }
    }
}

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    pub loss: Loss,
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio
    pub colsample_bytree: f64,
    /// L2 regularization
    pub reg_lambda: f64,
    /// Random seed
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            loss: Loss::SquaredError,
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            reg_lambda: 1.0,
            random_state: 42,
        }
    }
}

impl GradientBoostingConfig {
    /// Ensemble settings for one task at one depth
    pub fn from_tuning(tuning: &TuningConfig, mode: TaskMode, max_depth: usize) -> Self {
        Self {
            loss: mode.into(),
            n_estimators: tuning.n_estimators,
            learning_rate: tuning.learning_rate,
            max_depth,
            min_samples_leaf: tuning.min_samples_leaf,
            subsample: tuning.subsample,
            colsample_bytree: tuning.colsample_bytree,
            reg_lambda: tuning.reg_lambda,
            random_state: tuning.booster_seed,
        }
    }
}

/// Gradient boosted tree ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    feature_importances: Vec<f64>,
    n_features: usize,
}

impl GradientBoosting {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            feature_importances: Vec::new(),
            n_features: 0,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit the ensemble. For logistic loss `y` must hold 0/1 labels.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(BracketError::TrainingError("cannot fit on zero rows".to_string()));
        }
        if y.len() != n_samples {
            return Err(BracketError::ShapeError {
                expected: format!("{} targets", n_samples),
                actual: format!("{} targets", y.len()),
            });
        }
        if self.config.loss == Loss::Logistic && y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(BracketError::TrainingError(
                "logistic loss needs 0/1 labels".to_string(),
            ));
        }

        self.initial_prediction = self.base_margin(y);
        self.n_features = n_features;
        self.trees.clear();
        self.feature_importances = vec![0.0; n_features];

        let mut margins = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let order = SortedIndex::new(x);

        for _ in 0..self.config.n_estimators {
            // Negative gradient of the loss at the current margins
            let residuals: Array1<f64> = match self.config.loss {
                Loss::SquaredError => y - &margins,
                Loss::Logistic => y
                    .iter()
                    .zip(margins.iter())
                    .map(|(yi, mi)| yi - sigmoid(*mi))
                    .collect(),
            };

            let rows = sample_indices(n_samples, self.config.subsample, &mut rng);
            let cols = sample_indices(n_features, self.config.colsample_bytree, &mut rng);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_reg_lambda(self.config.reg_lambda);
            tree.fit_rows(x, &residuals, &order, &rows, &cols)?;

            let update = tree.predict(x)?;
            margins.scaled_add(self.config.learning_rate, &update);

            if let Some(tree_importance) = tree.feature_importances() {
                for (acc, imp) in self.feature_importances.iter_mut().zip(tree_importance.iter()) {
                    *acc += imp;
                }
            }

            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        Ok(())
    }

    fn base_margin(&self, y: &Array1<f64>) -> f64 {
        let mean = y.mean().unwrap_or(0.0);
        match self.config.loss {
            Loss::SquaredError => mean,
            Loss::Logistic => {
                let p = mean.clamp(1e-6, 1.0 - 1e-6);
                (p / (1.0 - p)).ln()
            }
        }
    }

    /// Raw margins (sum of shrunken tree outputs)
    pub fn predict_margin(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() && self.n_features == 0 {
            return Err(BracketError::ModelNotFitted);
        }
        let mut margins = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            margins.scaled_add(self.config.learning_rate, &update);
        }
        Ok(margins)
    }

    /// Predictions on the response scale: probabilities for logistic loss
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let margins = self.predict_margin(x)?;
        Ok(match self.config.loss {
            Loss::SquaredError => margins,
            Loss::Logistic => margins.mapv(sigmoid),
        })
    }

    /// Gain importances averaged over trees, summing to one
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Sorted random subset of `0..n`; the full range when `ratio >= 1`
fn sample_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if ratio >= 1.0 {
        return indices;
    }
    let sample_size = ((n as f64) * ratio).ceil().max(1.0) as usize;
    indices.shuffle(rng);
    indices.truncate(sample_size);
    indices.sort_unstable();
    indices
}
