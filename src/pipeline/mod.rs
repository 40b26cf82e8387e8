//! Two-stage, season-rotated prediction pipeline
//!
//! Stage 1 ([`Selector`]) predicts who is selected and fills each season's
//! field by rank. Stage 2 ([`Ranker`]) seeds the predicted field. Both stages
//! hold out the predicted season from training.

mod config;
mod folds;
mod record;
mod rotation;
pub mod seeding;
pub mod selection;

pub use config::PipelineConfig;
pub use folds::{FoldPartition, FoldSplit};
pub use record::{PredictionRecord, PredictionSet};
pub use rotation::{average_importances, rotate, FoldReport};
pub use seeding::{assign_seeds, play_in_role, seed_for_rank, PlayInRole, Ranker, SeedAssignment, SeedCandidate};
pub use selection::{select_field, Selector};

use crate::data::SeasonTable;
use crate::error::{BracketError, Result};
use crate::training::Tuner;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Fold diagnostics and importances of one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSummary {
    pub folds: Vec<FoldReport>,
    /// Importances averaged across folds
    pub importances: Vec<(String, f64)>,
}

impl StageSummary {
    fn new(folds: Vec<FoldReport>) -> Self {
        let importances = average_importances(&folds);
        Self { folds, importances }
    }
}

/// Result of a full run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub predictions: PredictionSet,
    pub selection: StageSummary,
    pub seeding: StageSummary,
}

/// Runs both stages over a season table
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, table: &SeasonTable) -> Result<PipelineOutput> {
        self.config.tuning.validate()?;
        let start = Instant::now();
        let partition = FoldPartition::from_table(table)?;
        let tuner = Tuner::new(self.config.tuning.clone());

        info!(folds = partition.len(), rows = table.len(), "Stage 1: selection");
        let selector = Selector::new(tuner.clone(), self.config.data.field_size);
        let (selections, selection_folds) = selector.run(table, &partition)?;
        if selections.len() != table.len() {
            return Err(BracketError::ValidationError(format!(
                "selection predicted {} of {} rows",
                selections.len(),
                table.len()
            )));
        }
        let selected: Vec<bool> = selections.iter().map(|p| p.selected).collect();

        info!(selected = selected.iter().filter(|s| **s).count(), "Stage 2: seeding");
        let ranker = Ranker::new(tuner);
        let (seeds, seeding_folds) = ranker.run(table, &partition, &selected)?;

        let mut seed_iter = seeds.into_iter().peekable();
        let records: Vec<PredictionRecord> = table
            .rows()
            .iter()
            .zip(selections)
            .enumerate()
            .map(|(i, (row, sel))| {
                let seed = seed_iter.next_if(|s| s.row == i);
                PredictionRecord {
                    team: row.team.clone(),
                    season: row.season,
                    fold: row.fold,
                    made_tournament: row.made_tournament,
                    seed: row.seed,
                    conference_champion: row.conference_champion,
                    selection_probability: sel.probability,
                    selected: sel.selected,
                    seed_score: seed.map(|s| s.score),
                    predicted_seed: seed.map(|s| s.seed),
                    play_in_role: seed.map(|s| s.role),
                }
            })
            .collect();

        let predictions = PredictionSet::new(records);
        info!(
            records = predictions.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline finished"
        );

        Ok(PipelineOutput {
            predictions,
            selection: StageSummary::new(selection_folds),
            seeding: StageSummary::new(seeding_folds),
        })
    }
}
