//! Model traits at the boundary between tuning and the boosting backend

use super::config::{TaskMode, TuningConfig};
use super::gradient_boosting::{GradientBoosting, GradientBoostingConfig};
use crate::error::Result;
use ndarray::{Array1, Array2};

/// A fitted model
pub trait Booster: Send + Sync {
    /// Probabilities for classification, scores for regression
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Importance of every design-matrix column, summing to one
    fn feature_importances(&self) -> Vec<f64>;
}

/// Something that can fit a [`Booster`] at a given tree depth
pub trait Learner: Send + Sync {
    fn fit(
        &self,
        mode: TaskMode,
        max_depth: usize,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Box<dyn Booster>>;
}

impl Booster for GradientBoosting {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        GradientBoosting::predict(self, x)
    }

    fn feature_importances(&self) -> Vec<f64> {
        GradientBoosting::feature_importances(self).to_vec()
    }
}

/// Learner backed by the in-crate gradient boosted trees
#[derive(Debug, Clone, Default)]
pub struct GradientBoostingLearner {
    tuning: TuningConfig,
}

impl GradientBoostingLearner {
    pub fn new(tuning: TuningConfig) -> Self {
        Self { tuning }
    }
}

impl Learner for GradientBoostingLearner {
    fn fit(
        &self,
        mode: TaskMode,
        max_depth: usize,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Box<dyn Booster>> {
        let config = GradientBoostingConfig::from_tuning(&self.tuning, mode, max_depth);
        let mut model = GradientBoosting::new(config);
        model.fit(x, y)?;
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learner_respects_mode() {
        let learner = GradientBoostingLearner::new(TuningConfig::default().with_n_estimators(20));
        let x = array![[0.0], [1.0], [5.0], [6.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let clf = learner.fit(TaskMode::Classification, 2, &x, &y).unwrap();
        let prob = clf.predict(&x).unwrap();
        assert!(prob.iter().all(|p| *p > 0.0 && *p < 1.0));

        let reg = learner.fit(TaskMode::Regression, 2, &x, &y).unwrap();
        assert_eq!(reg.feature_importances().len(), 1);
    }
}
