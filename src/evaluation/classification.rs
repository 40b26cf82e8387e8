//! Stage-1 selection accuracy

use crate::pipeline::PredictionSet;
use serde::{Deserialize, Serialize};

/// Selection mistakes of one season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonMisclassification {
    pub season: i32,
    pub teams: usize,
    pub predicted_selected: usize,
    pub committee_selected: usize,
    /// Selected by the committee, missed by the model
    pub false_negatives: Vec<String>,
    /// Picked by the model, left out by the committee
    pub false_positives: Vec<String>,
}

/// Selection accuracy over every team season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub total: usize,
    pub correct: usize,
    pub seasons: Vec<SeasonMisclassification>,
}

impl ClassificationReport {
    pub fn false_negative_total(&self) -> usize {
        self.seasons.iter().map(|s| s.false_negatives.len()).sum()
    }
}

pub fn classification_report(predictions: &PredictionSet) -> ClassificationReport {
    let total = predictions.len();
    let correct = predictions
        .records()
        .iter()
        .filter(|r| r.selected == r.made_tournament)
        .count();

    let seasons = predictions
        .seasons()
        .into_iter()
        .map(|season| {
            let mut report = SeasonMisclassification {
                season,
                teams: 0,
                predicted_selected: 0,
                committee_selected: 0,
                false_negatives: Vec::new(),
                false_positives: Vec::new(),
            };
            for r in predictions.season(season) {
                report.teams += 1;
                report.predicted_selected += usize::from(r.selected);
                report.committee_selected += usize::from(r.made_tournament);
                match (r.made_tournament, r.selected) {
                    (true, false) => report.false_negatives.push(r.team.clone()),
                    (false, true) => report.false_positives.push(r.team.clone()),
                    _ => {}
                }
            }
            report
        })
        .collect();

    ClassificationReport {
        accuracy: if total == 0 { 0.0 } else { correct as f64 / total as f64 },
        total,
        correct,
        seasons,
    }
}
