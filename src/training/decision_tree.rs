//! Regression tree used as the boosting base learner
//!
//! Splits are found by a sorted scan per feature. Missing values (NaN) are
//! not imputed: every split learns which side they fall to.

use crate::error::{BracketError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        /// Side taken by rows whose feature is NaN
        missing_left: bool,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        gain: f64,
    },
}

/// Best split candidate of one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    missing_left: bool,
    gain: f64,
}

/// Row indices of every column sorted by value, NaN rows omitted.
///
/// Built once per ensemble; every tree scans it instead of sorting per node.
#[derive(Debug, Clone)]
pub struct SortedIndex {
    sorted: Vec<Vec<usize>>,
}

impl SortedIndex {
    pub fn new(x: &Array2<f64>) -> Self {
        let sorted = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let mut idx: Vec<usize> = (0..x.nrows()).filter(|&i| !x[[i, j]].is_nan()).collect();
                idx.sort_by(|&a, &b| {
                    x[[a, j]].partial_cmp(&x[[b, j]]).unwrap_or(Ordering::Equal)
                });
                idx
            })
            .collect();
        Self { sorted }
    }
}

struct FitContext<'a> {
    x: &'a Array2<f64>,
    y: &'a Array1<f64>,
    order: &'a SortedIndex,
    features: &'a [usize],
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth (root at depth 0)
    pub max_depth: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values
    pub reg_lambda: f64,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: 6,
            min_samples_leaf: 1,
            reg_lambda: 0.0,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the L2 leaf penalty
    pub fn with_reg_lambda(mut self, lambda: f64) -> Self {
        self.reg_lambda = lambda.max(0.0);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let order = SortedIndex::new(x);
        let rows: Vec<usize> = (0..x.nrows()).collect();
        let features: Vec<usize> = (0..x.ncols()).collect();
        self.fit_rows(x, y, &order, &rows, &features)
    }

    /// Fit on a subset of rows and features, reusing a presorted index.
    ///
    /// Feature indices stored in the tree are column indices of `x`.
    pub fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        order: &SortedIndex,
        rows: &[usize],
        features: &[usize],
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(BracketError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if rows.is_empty() {
            return Err(BracketError::TrainingError("cannot fit a tree on zero rows".to_string()));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let mut in_node = vec![false; x.nrows()];
        let ctx = FitContext {
            x,
            y,
            order,
            features,
        };

        self.root = Some(self.build_tree(&ctx, rows, 0, &mut in_node, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn leaf_value(&self, sum: f64, count: usize) -> f64 {
        sum / (count as f64 + self.reg_lambda)
    }

    fn score(&self, sum: f64, count: usize) -> f64 {
        sum * sum / (count as f64 + self.reg_lambda)
    }

    fn build_tree(
        &self,
        ctx: &FitContext<'_>,
        indices: &[usize],
        depth: usize,
        in_node: &mut [bool],
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let sum: f64 = indices.iter().map(|&i| ctx.y[i]).sum();
        let leaf = TreeNode::Leaf {
            value: self.leaf_value(sum, n_samples),
            n_samples,
        };

        if depth >= self.max_depth || n_samples < 2 * self.min_samples_leaf {
            return leaf;
        }

        for &i in indices {
            in_node[i] = true;
        }
        let best = self.find_best_split(ctx, in_node, n_samples, sum);
        for &i in indices {
            in_node[i] = false;
        }
        let best = match best {
            Some(best) => best,
            None => return leaf,
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| {
                let v = ctx.x[[i, best.feature_idx]];
                if v.is_nan() {
                    best.missing_left
                } else {
                    v <= best.threshold
                }
            });

        if left_indices.is_empty() || right_indices.is_empty() {
            return leaf;
        }

        importances[best.feature_idx] += best.gain;

        let left = Box::new(self.build_tree(ctx, &left_indices, depth + 1, in_node, importances));
        let right = Box::new(self.build_tree(ctx, &right_indices, depth + 1, in_node, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            missing_left: best.missing_left,
            left,
            right,
            n_samples,
            gain: best.gain,
        }
    }

    fn find_best_split(
        &self,
        ctx: &FitContext<'_>,
        in_node: &[bool],
        n: usize,
        total_sum: f64,
    ) -> Option<SplitCandidate> {
        let parent_score = self.score(total_sum, n);
        let min_leaf = self.min_samples_leaf;
        let x = ctx.x;
        let y = ctx.y;

        let per_feature: Vec<Option<SplitCandidate>> = ctx
            .features
            .par_iter()
            .map(|&feature_idx| {
                let present: Vec<usize> = ctx.order.sorted[feature_idx]
                    .iter()
                    .copied()
                    .filter(|&i| in_node[i])
                    .collect();
                if present.len() < 2 {
                    return None;
                }

                let present_sum: f64 = present.iter().map(|&i| y[i]).sum();
                let missing_sum = total_sum - present_sum;
                let missing_count = n - present.len();
                let mut best: Option<SplitCandidate> = None;
                let mut prefix_sum = 0.0;

                for k in 0..present.len() - 1 {
                    prefix_sum += y[present[k]];
                    let here = x[[present[k], feature_idx]];
                    let next = x[[present[k + 1], feature_idx]];
                    if here == next {
                        continue;
                    }
                    let threshold = (here + next) / 2.0;
                    let base_left = k + 1;
                    let base_right = present.len() - base_left;

                    // missing rows to the right, then to the left
                    for missing_left in [false, true] {
                        let (left_n, left_sum, right_n, right_sum) = if missing_left {
                            (
                                base_left + missing_count,
                                prefix_sum + missing_sum,
                                base_right,
                                present_sum - prefix_sum,
                            )
                        } else {
                            (
                                base_left,
                                prefix_sum,
                                base_right + missing_count,
                                present_sum - prefix_sum + missing_sum,
                            )
                        };
                        if left_n < min_leaf || right_n < min_leaf {
                            continue;
                        }
                        let gain = self.score(left_sum, left_n) + self.score(right_sum, right_n)
                            - parent_score;
                        if gain > best.map_or(1e-12, |b| b.gain) {
                            best = Some(SplitCandidate {
                                feature_idx,
                                threshold,
                                missing_left,
                                gain,
                            });
                        }
                        if missing_count == 0 {
                            break;
                        }
                    }
                }
                best
            })
            .collect();

        // Highest gain wins; ties go to the earliest candidate feature
        per_feature.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some(b) if b.gain >= cand.gain => Some(b),
            _ => Some(cand),
        })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BracketError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(BracketError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| Self::predict_sample(root, &row))
            .collect())
    }

    fn predict_sample(node: &TreeNode, sample: &ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                missing_left,
                left,
                right,
                ..
            } => {
                let v = sample[*feature_idx];
                let go_left = if v.is_nan() { *missing_left } else { v <= *threshold };
                if go_left {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Normalised gain importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth (a single leaf has depth 0)
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();
        let predictions = tree.predict(&x).unwrap();

        let mse: f64 = predictions
            .iter()
            .zip(y.iter())
            .map(|(p, a)| (p - a).powi(2))
            .sum::<f64>()
            / y.len() as f64;
        assert!(mse < 0.5, "MSE too high: {}", mse);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0], [5.0, 0.0], [6.0, 9.0]];
        let y = array![0.0, 1.0, 0.0, 1.0, 0.0, 1.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();
        assert!(tree.get_depth() <= 2);
    }

    #[test]
    fn test_missing_values_follow_learned_side() {
        // NaN rows share the target of the high-valued rows
        let x = array![[1.0], [2.0], [f64::NAN], [8.0], [9.0], [f64::NAN]];
        let y = array![0.0, 0.0, 10.0, 10.0, 10.0, 10.0];

        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&array![[f64::NAN], [1.5]]).unwrap();
        assert!((pred[0] - 10.0).abs() < 1e-9);
        assert!(pred[1].abs() < 1e-9);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_fit_rows_ignores_rows_outside_subset() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 1.0], [4.0, 1.0]];
        let y = array![0.0, 0.0, 100.0, 1.0];
        let order = SortedIndex::new(&x);

        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit_rows(&x, &y, &order, &[0, 1, 3], &[0]).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[1], 0.0);
        let pred = tree.predict(&x).unwrap();
        assert!((pred[3] - 1.0).abs() < 1e-9);
        assert!(pred[0].abs() < 1e-9);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(BracketError::ModelNotFitted)
        ));
    }
}
