//! Stratified k-fold splitting used by depth tuning

use crate::error::{BracketError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How rows are grouped before being dealt into folds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strata {
    /// One stratum per class label
    Classes,
    /// Quantile bins of a continuous target
    QuantileBins(usize),
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter with a fixed seed
#[derive(Debug, Clone)]
pub struct CrossValidator {
    n_splits: usize,
    strata: Strata,
    random_state: u64,
}

impl CrossValidator {
    pub fn new(n_splits: usize, strata: Strata) -> Self {
        Self {
            n_splits,
            strata,
            random_state: 1,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Generate train/test splits.
    ///
    /// Rows of each stratum are shuffled and dealt round-robin; the dealing
    /// offset carries over between strata so fold sizes differ by at most one.
    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CVSplit>> {
        let n_samples = y.len();
        if self.n_splits < 2 {
            return Err(BracketError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(BracketError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, self.n_splits
            )));
        }

        let labels = self.stratum_labels(y);
        let mut strata: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, label) in labels.into_iter().enumerate() {
            strata.entry(label).or_default().push(idx);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut offset = 0;

        for indices in strata.values_mut() {
            indices.shuffle(&mut rng);
            for (i, &idx) in indices.iter().enumerate() {
                folds[(offset + i) % self.n_splits].push(idx);
            }
            offset = (offset + indices.len()) % self.n_splits;
        }

        let splits = (0..self.n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }

    fn stratum_labels(&self, y: &Array1<f64>) -> Vec<i64> {
        match self.strata {
            Strata::Classes => y.iter().map(|v| v.round() as i64).collect(),
            Strata::QuantileBins(bins) => {
                let mut sorted: Vec<f64> = y.to_vec();
                sorted.sort_by(|a, b| a.total_cmp(b));
                let cuts: Vec<f64> = (1..bins.max(1))
                    .map(|k| quantile_type7(&sorted, k as f64 / bins as f64))
                    .collect();
                y.iter()
                    .map(|v| cuts.iter().filter(|c| v > c).count() as i64)
                    .collect()
            }
        }
    }
}

/// Type-7 sample quantile of ascending data: linear interpolation between
/// the order statistics around `(n - 1) * p`.
pub fn quantile_type7(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_partition_rows() {
        let y = Array1::from_shape_fn(23, |i| (i % 2) as f64);
        let splits = CrossValidator::new(5, Strata::Classes).split(&y).unwrap();

        let mut seen: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 23);
            let size = split.test_indices.len();
            assert!(size == 4 || size == 5, "unbalanced fold of {}", size);
        }
    }

    #[test]
    fn test_classes_spread_across_folds() {
        let mut labels = vec![0.0; 40];
        labels.extend(vec![1.0; 10]);
        let y = Array1::from_vec(labels);
        let splits = CrossValidator::new(5, Strata::Classes).split(&y).unwrap();

        for split in &splits {
            let positives = split.test_indices.iter().filter(|&&i| y[i] == 1.0).count();
            assert_eq!(positives, 2);
        }
    }

    #[test]
    fn test_split_is_reproducible() {
        let y = Array1::from_shape_fn(30, |i| i as f64);
        let cv = CrossValidator::new(5, Strata::QuantileBins(4)).with_random_state(7);
        let a = cv.split(&y).unwrap();
        let b = cv.split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_too_few_rows() {
        let y = Array1::from_vec(vec![1.0, 2.0]);
        assert!(CrossValidator::new(5, Strata::Classes).split(&y).is_err());
    }

    #[test]
    fn test_quantile_type7() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_type7(&data, 0.0), 1.0);
        assert_eq!(quantile_type7(&data, 1.0), 4.0);
        assert!((quantile_type7(&data, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile_type7(&data, 1.0 / 3.0) - 2.0).abs() < 1e-12);
    }
}
