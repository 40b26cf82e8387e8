//! Depth search by cross-validation followed by a refit on all training rows

use super::config::{Metric, TaskMode, TuningConfig};
use super::cross_validation::{CVSplit, CrossValidator, Strata};
use super::models::{Booster, GradientBoostingLearner, Learner};
use crate::error::{BracketError, Result};
use crate::preprocessing::{target_vector, Recipe};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What to learn from a training frame
#[derive(Debug, Clone)]
pub struct FitTask {
    pub target: String,
    pub mode: TaskMode,
    pub metric: Metric,
    /// Columns never used as predictors
    pub excluded: Vec<String>,
}

impl FitTask {
    pub fn new(target: &str, mode: TaskMode, metric: Metric) -> Self {
        Self {
            target: target.to_string(),
            mode,
            metric,
            excluded: Vec::new(),
        }
    }

    pub fn with_excluded(mut self, columns: &[&str]) -> Self {
        self.excluded = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

/// Cross-validated score of one candidate depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthScore {
    pub depth: usize,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
}

/// Recipe and booster refit at the selected depth
pub struct FittedModel {
    recipe: Recipe,
    booster: Box<dyn Booster>,
    mode: TaskMode,
    depth: usize,
    grid: Vec<DepthScore>,
}

impl FittedModel {
    /// Predict rows with the training layout
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.recipe.transform(df)?;
        self.booster.predict(&x)
    }

    /// Design-matrix columns paired with their importance
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        self.recipe
            .feature_names()
            .iter()
            .cloned()
            .zip(self.booster.feature_importances())
            .collect()
    }

    pub fn mode(&self) -> TaskMode {
        self.mode
    }

    /// Selected tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Mean cross-validated score at the selected depth
    pub fn cv_score(&self) -> f64 {
        self.grid
            .iter()
            .find(|g| g.depth == self.depth)
            .map_or(f64::NAN, |g| g.mean_score)
    }

    pub fn grid(&self) -> &[DepthScore] {
        &self.grid
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }
}

/// Runs the depth search for one task
#[derive(Clone)]
pub struct Tuner {
    config: TuningConfig,
    learner: Arc<dyn Learner>,
}

impl Tuner {
    pub fn new(config: TuningConfig) -> Self {
        let learner = Arc::new(GradientBoostingLearner::new(config.clone()));
        Self { config, learner }
    }

    /// Swap the boosting backend
    pub fn with_learner(mut self, learner: Arc<dyn Learner>) -> Self {
        self.learner = learner;
        self
    }

    pub fn config(&self) -> &TuningConfig {
        &self.config
    }

    /// Pick the depth with the best mean cross-validated score, then refit.
    ///
    /// Every candidate depth sees the same folds. Ties go to the shallower depth.
    pub fn tune_and_fit(&self, train: &DataFrame, task: &FitTask) -> Result<FittedModel> {
        self.config.validate()?;
        let start = Instant::now();

        let y = target_vector(train, &task.target)?;
        let strata = match task.mode {
            TaskMode::Classification => Strata::Classes,
            TaskMode::Regression => Strata::QuantileBins(self.config.strata_bins),
        };
        let splits = CrossValidator::new(self.config.cv_folds, strata)
            .with_random_state(self.config.cv_seed)
            .split(&y)?;

        let depths = self.config.depth_grid();
        let jobs: Vec<(usize, &CVSplit)> = depths
            .iter()
            .flat_map(|&d| splits.iter().map(move |s| (d, s)))
            .collect();

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(depth, split)| self.score_split(train, task, depth, split))
            .collect::<Result<_>>()?;

        let grid: Vec<DepthScore> = depths
            .iter()
            .enumerate()
            .map(|(i, &depth)| {
                let fold_scores = scores[i * splits.len()..(i + 1) * splits.len()].to_vec();
                let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
                DepthScore {
                    depth,
                    fold_scores,
                    mean_score,
                }
            })
            .collect();

        let best = select_best(&grid, task.metric)?;
        for entry in &grid {
            debug!(
                target = %task.target,
                depth = entry.depth,
                score = entry.mean_score,
                metric = task.metric.name(),
                "Depth evaluated"
            );
        }

        let recipe = Recipe::fit(train, &task.target, &excluded_refs(task))?;
        let x = recipe.transform(train)?;
        let booster = self.learner.fit(task.mode, best.depth, &x, &y)?;

        info!(
            target = %task.target,
            rows = train.height(),
            depth = best.depth,
            score = best.mean_score,
            metric = task.metric.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tuned and refit"
        );

        Ok(FittedModel {
            recipe,
            booster,
            mode: task.mode,
            depth: best.depth,
            grid,
        })
    }

    fn score_split(&self, train: &DataFrame, task: &FitTask, depth: usize, split: &CVSplit) -> Result<f64> {
        let fit_rows = take_rows(train, &split.train_indices)?;
        let held_out = take_rows(train, &split.test_indices)?;

        // The recipe is refit inside every fold so held-out rows never inform scaling
        let recipe = Recipe::fit(&fit_rows, &task.target, &excluded_refs(task))?;
        let x_fit = recipe.transform(&fit_rows)?;
        let y_fit = recipe.target(&fit_rows)?;
        let booster = self.learner.fit(task.mode, depth, &x_fit, &y_fit)?;

        let x_test = recipe.transform(&held_out)?;
        let y_test = recipe.target(&held_out)?;
        let pred = booster.predict(&x_test)?;

        Ok(task.metric.score(&y_test.to_vec(), &pred.to_vec()))
    }
}

fn excluded_refs(task: &FitTask) -> Vec<&str> {
    task.excluded.iter().map(String::as_str).collect()
}

fn select_best(grid: &[DepthScore], metric: Metric) -> Result<&DepthScore> {
    let mut best: Option<&DepthScore> = None;
    for entry in grid {
        let better = match best {
            None => true,
            Some(b) if metric.higher_is_better() => entry.mean_score > b.mean_score,
            Some(b) => entry.mean_score < b.mean_score,
        };
        if better {
            best = Some(entry);
        }
    }
    best.ok_or_else(|| BracketError::TrainingError("empty depth grid".to_string()))
}

/// Subset of rows by position
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}
