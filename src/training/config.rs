//! Tuning and fitting configuration

use crate::error::{BracketError, Result};
use serde::{Deserialize, Serialize};

/// Learning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskMode {
    /// Binary classification; predictions are probabilities of class 1
    Classification,
    /// Regression on a continuous target
    Regression,
}

/// Metric used to pick the tree depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Share of correct labels at a 0.5 probability threshold (maximise)
    Accuracy,
    /// Root mean squared error (minimise)
    Rmse,
}

impl Metric {
    /// Whether a larger score is better
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Metric::Accuracy)
    }

    /// Score predictions against truth
    pub fn score(&self, y_true: &[f64], y_pred: &[f64]) -> f64 {
        match self {
            Metric::Accuracy => accuracy(y_true, y_pred),
            Metric::Rmse => mse(y_true, y_pred).sqrt(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Accuracy => "accuracy",
            Metric::Rmse => "rmse",
        }
    }
}

/// Share of rows whose thresholded prediction matches the label
pub fn accuracy(y_true: &[f64], y_prob: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_prob.iter())
        .filter(|(t, p)| (**t >= 0.5) == (**p >= 0.5))
        .count();
    correct as f64 / y_true.len() as f64
}

/// Mean squared error
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Configuration for hyperparameter search and final fits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Trees per ensemble
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Smallest tree depth in the search range
    pub min_depth: usize,
    /// Largest tree depth in the search range
    pub max_depth: usize,
    /// Evenly spaced grid levels over the depth range (rounded, deduplicated)
    pub grid_levels: usize,
    /// Cross-validation folds per tuning run
    pub cv_folds: usize,
    /// Seed of the cross-validation fold assignment
    pub cv_seed: u64,
    /// Quantile bins used to stratify a numeric target
    pub strata_bins: usize,
    /// Minimum rows per leaf
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values
    pub reg_lambda: f64,
    /// Row subsample ratio per tree
    pub subsample: f64,
    /// Column subsample ratio per tree
    pub colsample_bytree: f64,
    /// Seed of the per-tree row and column sampling
    pub booster_seed: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            n_estimators: 1500,
            learning_rate: 0.3,
            min_depth: 3,
            max_depth: 6,
            grid_levels: 10,
            cv_folds: 5,
            cv_seed: 1,
            strata_bins: 4,
            min_samples_leaf: 1,
            reg_lambda: 1.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            booster_seed: 42,
        }
    }
}

impl TuningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ensemble size
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Set the depth search range
    pub fn with_depth_range(mut self, min_depth: usize, max_depth: usize) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    /// Set the number of grid levels
    pub fn with_grid_levels(mut self, levels: usize) -> Self {
        self.grid_levels = levels;
        self
    }

    /// Set the cross-validation folds and seed
    pub fn with_cv(mut self, folds: usize, seed: u64) -> Self {
        self.cv_folds = folds;
        self.cv_seed = seed;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Validate ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(BracketError::ConfigError("n_estimators must be positive".to_string()));
        }
        if self.min_depth == 0 || self.min_depth > self.max_depth {
            return Err(BracketError::ConfigError(format!(
                "invalid depth range {}..={}",
                self.min_depth, self.max_depth
            )));
        }
        if self.grid_levels == 0 {
            return Err(BracketError::ConfigError("grid_levels must be positive".to_string()));
        }
        if self.cv_folds < 2 {
            return Err(BracketError::ConfigError("cv_folds must be at least 2".to_string()));
        }
        if self.strata_bins == 0 {
            return Err(BracketError::ConfigError("strata_bins must be positive".to_string()));
        }
        for (name, ratio) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(BracketError::ConfigError(format!("{} must be in (0, 1]", name)));
            }
        }
        if !(self.learning_rate > 0.0) {
            return Err(BracketError::ConfigError("learning_rate must be positive".to_string()));
        }
        Ok(())
    }

    /// Candidate depths: `grid_levels` evenly spaced points over the range,
    /// rounded to integers and deduplicated.
    pub fn depth_grid(&self) -> Vec<usize> {
        depth_grid(self.min_depth, self.max_depth, self.grid_levels)
    }
}

/// Rounded, deduplicated regular grid over an integer range
pub fn depth_grid(lo: usize, hi: usize, levels: usize) -> Vec<usize> {
    if levels <= 1 || lo >= hi {
        return vec![lo];
    }
    let step = (hi - lo) as f64 / (levels - 1) as f64;
    let mut grid: Vec<usize> = (0..levels)
        .map(|i| (lo as f64 + step * i as f64).round() as usize)
        .collect();
    grid.dedup();
    grid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_levels_collapse_to_four_depths() {
        assert_eq!(TuningConfig::default().depth_grid(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_single_level_grid() {
        assert_eq!(depth_grid(3, 6, 1), vec![3]);
        assert_eq!(depth_grid(4, 4, 10), vec![4]);
    }

    #[test]
    fn test_metric_direction() {
        assert!(Metric::Accuracy.higher_is_better());
        assert!(!Metric::Rmse.higher_is_better());
    }

    #[test]
    fn test_accuracy_thresholds_probabilities() {
        let y = [1.0, 0.0, 1.0, 0.0];
        let p = [0.9, 0.2, 0.4, 0.5];
        assert!((accuracy(&y, &p) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rmse() {
        let score = Metric::Rmse.score(&[1.0, 2.0], &[2.0, 4.0]);
        assert!((score - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        let config = TuningConfig::default().with_depth_range(6, 3);
        assert!(config.validate().is_err());
        assert!(TuningConfig::default().validate().is_ok());
    }
}
