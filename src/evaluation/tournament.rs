//! Head-to-head check of model and committee seeds against real games
//!
//! In every game the better (lower) seed is the favourite. A result is 1
//! when the favourite won; the error is the seed gap when it lost.

use crate::data::{GameResult, SEED_LINES};
use crate::error::{BracketError, Result};
use crate::pipeline::PredictionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Stand-in seed for a team outside the model's field: one line past the bracket
pub const UNSEEDED: u8 = SEED_LINES + 1;

/// Favourite outcome of one game under one seeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    /// 1 if the better seed won
    pub result: u8,
    /// Winner's seed minus loser's seed when the better seed lost, else 0
    pub error: i32,
}

impl Pick {
    /// Equal seeds have no favourite and score as a miss with no error
    pub fn from_seeds(winner_seed: u8, loser_seed: u8) -> Self {
        match winner_seed.cmp(&loser_seed) {
            std::cmp::Ordering::Less => Pick { result: 1, error: 0 },
            std::cmp::Ordering::Greater => Pick {
                result: 0,
                error: i32::from(winner_seed) - i32::from(loser_seed),
            },
            std::cmp::Ordering::Equal => Pick { result: 0, error: 0 },
        }
    }
}

/// One game with both seedings scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub season: i32,
    pub winner: String,
    pub loser: String,
    pub committee_winner_seed: u8,
    pub committee_loser_seed: u8,
    pub model_winner_seed: Option<u8>,
    pub model_loser_seed: Option<u8>,
    /// Both teams share a committee seed line
    pub play_in: bool,
    pub committee: Pick,
    /// `None` when the model left both teams out of its field
    pub model: Option<Pick>,
}

/// Score one game.
///
/// A team missing from the model's field is treated as [`UNSEEDED`], so a
/// present team is always the model's favourite against it.
pub fn score_game(
    season: i32,
    winner: &str,
    loser: &str,
    committee: (u8, u8),
    model: (Option<u8>, Option<u8>),
) -> GameOutcome {
    let model_pick = match model {
        (None, None) => None,
        (w, l) => Some(Pick::from_seeds(
            w.unwrap_or(UNSEEDED),
            l.unwrap_or(UNSEEDED),
        )),
    };
    GameOutcome {
        season,
        winner: winner.to_string(),
        loser: loser.to_string(),
        committee_winner_seed: committee.0,
        committee_loser_seed: committee.1,
        model_winner_seed: model.0,
        model_loser_seed: model.1,
        play_in: committee.0 == committee.1,
        committee: Pick::from_seeds(committee.0, committee.1),
        model: model_pick,
    }
}

/// Means over non-play-in games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub games: usize,
    pub play_in_games: usize,
    /// Non-play-in games where the model seeded at least one team
    pub model_games: usize,
    pub model_accuracy: Option<f64>,
    pub model_mean_error: Option<f64>,
    pub committee_games: usize,
    pub committee_accuracy: Option<f64>,
    pub committee_mean_error: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentReport {
    pub games: Vec<GameOutcome>,
    pub summary: TournamentSummary,
}

/// Score every game of a modelled season.
///
/// Games from seasons without predictions are skipped. A game team without a
/// committee seed is a data error.
pub fn tournament_report(predictions: &PredictionSet, games: &[GameResult]) -> Result<TournamentReport> {
    let seasons: BTreeSet<i32> = predictions.seasons().into_iter().collect();
    let mut outcomes = Vec::with_capacity(games.len());
    let mut skipped = 0usize;

    for game in games {
        if !seasons.contains(&game.season) {
            skipped += 1;
            continue;
        }
        let lookup = |team: &str| {
            let record = predictions.find(game.season, team);
            let committee = record.and_then(|r| r.seed).ok_or_else(|| {
                BracketError::DataError(format!(
                    "{} played in {} without a committee seed",
                    team, game.season
                ))
            })?;
            Ok::<_, BracketError>((committee, record.and_then(|r| r.predicted_seed)))
        };
        let (c_w, m_w) = lookup(game.winner())?;
        let (c_l, m_l) = lookup(game.loser())?;
        outcomes.push(score_game(
            game.season,
            game.winner(),
            game.loser(),
            (c_w, c_l),
            (m_w, m_l),
        ));
    }

    if skipped > 0 {
        warn!(skipped, "Games from seasons without predictions ignored");
    }

    let summary = summarize(&outcomes);
    debug!(games = summary.games, play_ins = summary.play_in_games, "Tournament games scored");
    Ok(TournamentReport {
        games: outcomes,
        summary,
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

pub fn summarize(outcomes: &[GameOutcome]) -> TournamentSummary {
    let scored: Vec<&GameOutcome> = outcomes.iter().filter(|g| !g.play_in).collect();
    let committee: Vec<Pick> = scored.iter().map(|g| g.committee).collect();
    let model: Vec<Pick> = scored.iter().filter_map(|g| g.model).collect();

    let results = |picks: &[Pick]| mean(&picks.iter().map(|p| f64::from(p.result)).collect::<Vec<_>>());
    let errors = |picks: &[Pick]| mean(&picks.iter().map(|p| f64::from(p.error)).collect::<Vec<_>>());

    TournamentSummary {
        games: outcomes.len(),
        play_in_games: outcomes.len() - scored.len(),
        model_games: model.len(),
        model_accuracy: results(&model),
        model_mean_error: errors(&model),
        committee_games: committee.len(),
        committee_accuracy: results(&committee),
        committee_mean_error: errors(&committee),
    }
}
