//! Stage 1: who gets in
//!
//! A classifier gives every team a selection probability; the field is then
//! filled by rank so each season gets exactly `field_size` teams.

use super::folds::{FoldPartition, FoldSplit};
use super::rotation::{rotate, FoldReport};
use crate::data::team_season::{FOLD, MADE_TOURNAMENT, SEASON, SEED, TEAM};
use crate::data::{SeasonTable, TeamSeason};
use crate::error::Result;
use crate::training::{FitTask, Metric, TaskMode, Tuner};
use std::cmp::Ordering;
use tracing::info;

/// Stage-1 output for one table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPrediction {
    /// Index into [`SeasonTable::rows`]
    pub row: usize,
    pub probability: f64,
    pub selected: bool,
}

/// Leave-one-season-out selection classifier
pub struct Selector {
    tuner: Tuner,
    field_size: usize,
}

impl Selector {
    pub fn new(tuner: Tuner, field_size: usize) -> Self {
        Self { tuner, field_size }
    }

    /// Classification on the selection label; bookkeeping columns and the
    /// seed never enter the design matrix.
    pub fn task() -> FitTask {
        FitTask::new(MADE_TOURNAMENT, TaskMode::Classification, Metric::Accuracy)
            .with_excluded(&[TEAM, SEASON, FOLD, SEED])
    }

    /// Predict every row from a model that never saw its season.
    ///
    /// Predictions come back ordered by row index.
    pub fn run(
        &self,
        table: &SeasonTable,
        partition: &FoldPartition,
    ) -> Result<(Vec<SelectionPrediction>, Vec<FoldReport>)> {
        let per_fold = rotate("selection", partition, |split| self.run_fold(table, split))?;

        let mut predictions = Vec::with_capacity(table.len());
        let mut reports = Vec::with_capacity(per_fold.len());
        for (preds, report) in per_fold {
            predictions.extend(preds);
            reports.push(report);
        }
        predictions.sort_by_key(|p| p.row);
        Ok((predictions, reports))
    }

    fn run_fold(
        &self,
        table: &SeasonTable,
        split: &FoldSplit,
    ) -> Result<(Vec<SelectionPrediction>, FoldReport)> {
        let rows = table.rows();
        let train: Vec<&TeamSeason> = split.train.iter().map(|&i| &rows[i]).collect();
        let test: Vec<&TeamSeason> = split.test.iter().map(|&i| &rows[i]).collect();

        let model = self.tuner.tune_and_fit(&table.frame(&train)?, &Self::task())?;
        let probabilities = model.predict(&table.frame(&test)?)?;

        let candidates: Vec<(&str, f64)> = test
            .iter()
            .zip(probabilities.iter())
            .map(|(row, p)| (row.team.as_str(), *p))
            .collect();
        let selected = select_field(&candidates, self.field_size);

        let predictions: Vec<SelectionPrediction> = split
            .test
            .iter()
            .zip(probabilities.iter())
            .zip(selected.iter())
            .map(|((&row, &probability), &selected)| SelectionPrediction {
                row,
                probability,
                selected,
            })
            .collect();

        let n_selected = selected.iter().filter(|s| **s).count();
        let committee = test.iter().filter(|r| r.made_tournament).count();
        info!(
            season = split.season,
            fold = split.fold,
            selected = n_selected,
            committee,
            "Selection field filled"
        );

        let report = FoldReport {
            fold: split.fold,
            season: split.season,
            train_rows: train.len(),
            test_rows: test.len(),
            depth: model.depth(),
            cv_score: model.cv_score(),
            importances: model.feature_importances(),
        };

        Ok((predictions, report))
    }
}

/// Mark the `field_size` most likely teams of one season as selected.
///
/// Ordered by probability descending, then team name ascending. A season
/// with fewer teams than the field selects everyone.
pub fn select_field(candidates: &[(&str, f64)], field_size: usize) -> Vec<bool> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        let (name_a, p_a) = candidates[a];
        let (name_b, p_b) = candidates[b];
        p_b.partial_cmp(&p_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| name_a.cmp(name_b))
    });

    let mut selected = vec![false; candidates.len()];
    for &i in order.iter().take(field_size) {
        selected[i] = true;
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_field_size_selected() {
        let names: Vec<String> = (0..70).map(|i| format!("T{:02}", i)).collect();
        let candidates: Vec<(&str, f64)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i as f64 / 100.0))
            .collect();

        let selected = select_field(&candidates, 68);
        assert_eq!(selected.iter().filter(|s| **s).count(), 68);
        assert!(!selected[0] && !selected[1]);
        assert!(selected[2..].iter().all(|s| *s));
    }

    #[test]
    fn test_ties_broken_by_name() {
        let candidates = vec![("Zeta", 0.5), ("Alpha", 0.5), ("Mid", 0.9)];
        assert_eq!(select_field(&candidates, 2), vec![false, true, true]);
    }

    #[test]
    fn test_small_season_selects_all() {
        let candidates = vec![("A", 0.1), ("B", 0.2)];
        assert_eq!(select_field(&candidates, 68), vec![true, true]);
    }

    #[test]
    fn test_stage_one_excludes_seed() {
        let task = Selector::task();
        assert!(task.excluded.iter().any(|c| c == SEED));
        assert!(task.excluded.iter().any(|c| c == FOLD));
        assert_eq!(task.target, MADE_TOURNAMENT);
    }
}
