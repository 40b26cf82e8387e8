//! Runs one fit/predict job per fold

use super::folds::{FoldPartition, FoldSplit};
use crate::error::{BracketError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{error, info};

/// What one fold's model looked like
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold: usize,
    pub season: i32,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Tree depth picked by cross-validation
    pub depth: usize,
    /// Mean cross-validated score at that depth
    pub cv_score: f64,
    /// Design-matrix column importances of the refit model
    pub importances: Vec<(String, f64)>,
}

/// Run `job` for every fold in parallel.
///
/// Results come back in fold order. The first failing fold aborts the run;
/// no season is ever skipped.
pub fn rotate<T, F>(stage: &str, partition: &FoldPartition, job: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&FoldSplit) -> Result<T> + Sync,
{
    let start = Instant::now();
    let results: Vec<T> = partition
        .splits()
        .par_iter()
        .map(|split| {
            job(split).map_err(|e| {
                error!(stage, fold = split.fold, season = split.season, error = %e, "Fold failed");
                BracketError::FoldFailed {
                    fold: split.fold,
                    season: split.season,
                    source: Box::new(e),
                }
            })
        })
        .collect::<Result<_>>()?;

    info!(
        stage,
        folds = partition.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rotation finished"
    );
    Ok(results)
}

/// Average per-fold importances; features absent from a fold count as zero.
///
/// Sorted by importance descending, then name.
pub fn average_importances(reports: &[FoldReport]) -> Vec<(String, f64)> {
    let mut totals: std::collections::BTreeMap<&str, f64> = std::collections::BTreeMap::new();
    for report in reports {
        for (name, value) in &report.importances {
            *totals.entry(name.as_str()).or_insert(0.0) += value;
        }
    }
    let n = reports.len().max(1) as f64;
    let mut averaged: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(name, total)| (name.to_string(), total / n))
        .collect();
    averaged.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    averaged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SeasonTable, TeamSeason};

    fn partition() -> FoldPartition {
        let rows = (0..6)
            .map(|i| TeamSeason {
                team: format!("T{}", i),
                season: 2017 + (i % 3) as i32,
                fold: 1 + i % 3,
                numeric: vec![],
                categorical: vec![],
                made_tournament: false,
                seed: None,
                conference_champion: false,
            })
            .collect();
        FoldPartition::from_table(&SeasonTable::new(vec![], vec![], rows).unwrap()).unwrap()
    }

    #[test]
    fn test_results_in_fold_order() {
        let seasons = rotate("test", &partition(), |split| Ok(split.season)).unwrap();
        assert_eq!(seasons, vec![2017, 2018, 2019]);
    }

    #[test]
    fn test_failing_fold_aborts() {
        let result = rotate("test", &partition(), |split| {
            if split.fold == 2 {
                Err(BracketError::TrainingError("boom".to_string()))
            } else {
                Ok(())
            }
        });
        match result {
            Err(BracketError::FoldFailed { fold, season, .. }) => {
                assert_eq!(fold, 2);
                assert_eq!(season, 2018);
            }
            other => panic!("expected fold failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_average_importances() {
        let report = |fold, importances: Vec<(&str, f64)>| FoldReport {
            fold,
            season: 2016 + fold as i32,
            train_rows: 0,
            test_rows: 0,
            depth: 3,
            cv_score: 0.0,
            importances: importances.into_iter().map(|(n, v)| (n.to_string(), v)).collect(),
        };
        let reports = vec![
            report(1, vec![("net", 0.8), ("sor", 0.2)]),
            report(2, vec![("net", 0.4), ("kpi", 0.6)]),
        ];
        let avg = average_importances(&reports);
        assert_eq!(avg[0].0, "net");
        assert!((avg[0].1 - 0.6).abs() < 1e-12);
        assert_eq!(avg[1].0, "kpi");
        assert!((avg[2].1 - 0.1).abs() < 1e-12);
    }
}
