//! Evaluation of the assembled predictions
//!
//! - Selection accuracy with per-season misses
//! - Seed MSE / RMSE over committee-selected teams
//! - Tournament game comparison of model and committee seeds

mod classification;
mod seed_error;
mod tournament;

pub use classification::{classification_report, ClassificationReport, SeasonMisclassification};
pub use seed_error::{seed_error_report, SeasonSeedError, SeedError, SeedErrorReport};
pub use tournament::{
    score_game, summarize, tournament_report, GameOutcome, Pick, TournamentReport,
    TournamentSummary, UNSEEDED,
};

use crate::data::GameResult;
use crate::error::Result;
use crate::pipeline::PredictionSet;
use serde::{Deserialize, Serialize};

/// All three evaluations of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub classification: ClassificationReport,
    pub seed_error: SeedErrorReport,
    pub tournament: TournamentReport,
}

pub fn evaluate(predictions: &PredictionSet, games: &[GameResult]) -> Result<Evaluation> {
    Ok(Evaluation {
        classification: classification_report(predictions),
        seed_error: seed_error_report(predictions),
        tournament: tournament_report(predictions, games)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::pipeline::PredictionRecord;

    pub(crate) fn record(team: &str, season: i32, made: bool, seed: Option<u8>) -> PredictionRecord {
        PredictionRecord {
            team: team.to_string(),
            season,
            fold: 1,
            made_tournament: made,
            seed,
            conference_champion: false,
            selection_probability: if made { 0.9 } else { 0.1 },
            selected: false,
            seed_score: None,
            predicted_seed: None,
            play_in_role: None,
        }
    }
}
