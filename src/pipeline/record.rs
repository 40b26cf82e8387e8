//! Assembled per-team predictions

use super::seeding::PlayInRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One team season with both stages' predictions attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub team: String,
    pub season: i32,
    pub fold: usize,
    /// Committee selection
    pub made_tournament: bool,
    /// Committee seed
    pub seed: Option<u8>,
    pub conference_champion: bool,
    /// Stage-1 probability of selection
    pub selection_probability: f64,
    /// Stage-1 decision after the field cutoff
    pub selected: bool,
    /// Stage-2 continuous score, for predicted-selected teams
    pub seed_score: Option<f64>,
    /// Stage-2 seed line, for predicted-selected teams
    pub predicted_seed: Option<u8>,
    pub play_in_role: Option<PlayInRole>,
}

/// Every team season, predicted exactly once. Ordered by season then team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionSet {
    records: Vec<PredictionRecord>,
}

impl PredictionSet {
    pub fn new(mut records: Vec<PredictionRecord>) -> Self {
        records.sort_by(|a, b| a.season.cmp(&b.season).then_with(|| a.team.cmp(&b.team)));
        Self { records }
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn seasons(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.season)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn season(&self, season: i32) -> impl Iterator<Item = &PredictionRecord> {
        self.records.iter().filter(move |r| r.season == season)
    }

    /// Look up one team season
    pub fn find(&self, season: i32, team: &str) -> Option<&PredictionRecord> {
        self.records
            .binary_search_by(|r| r.season.cmp(&season).then_with(|| r.team.as_str().cmp(team)))
            .ok()
            .map(|i| &self.records[i])
    }

    /// Predicted-selected teams of a season
    pub fn selected_count(&self, season: i32) -> usize {
        self.season(season).filter(|r| r.selected).count()
    }
}
