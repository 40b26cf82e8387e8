//! Stage 2: where they land
//!
//! A regression on the committee seed scores every predicted-selected team.
//! Scores are then turned into seed lines, with two play-in pairs resolved
//! by an ordered rule table.

use super::folds::{FoldPartition, FoldSplit};
use super::rotation::{rotate, FoldReport};
use crate::data::team_season::{FOLD, MADE_TOURNAMENT, SEASON, SEED, TEAM};
use crate::data::{SeasonTable, TeamSeason, SEED_LINES, TEAMS_PER_LINE};
use crate::error::{BracketError, Result};
use crate::training::{quantile_type7, FitTask, Metric, TaskMode, Tuner};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, info};

/// Play-in status of a predicted-selected team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayInRole {
    /// Automatic bid; never part of a play-in pair
    Champion,
    /// Fourth-worst at-large team; shares a line with `Anchor1`
    Float1,
    /// Fifth-worst at-large team
    Anchor1,
    /// Second-worst at-large team; shares a line with `Anchor2`
    Float2,
    /// Third-worst at-large team
    Anchor2,
    Standard,
}

impl PlayInRole {
    pub fn is_float(&self) -> bool {
        matches!(self, PlayInRole::Float1 | PlayInRole::Float2)
    }

    /// Anchor partner of a float
    pub fn anchor(&self) -> Option<PlayInRole> {
        match self {
            PlayInRole::Float1 => Some(PlayInRole::Anchor1),
            PlayInRole::Float2 => Some(PlayInRole::Anchor2),
            _ => None,
        }
    }

    /// Quantile of the anchor band a float takes its seed from
    pub fn band_quantile(&self) -> Option<f64> {
        match self {
            PlayInRole::Float1 => Some(0.0),
            PlayInRole::Float2 => Some(1.0 / 3.0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayInRole::Champion => "champion",
            PlayInRole::Float1 => "float1",
            PlayInRole::Anchor1 => "anchor1",
            PlayInRole::Float2 => "float2",
            PlayInRole::Anchor2 => "anchor2",
            PlayInRole::Standard => "standard",
        }
    }
}

impl fmt::Display for PlayInRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts the role rules look at
#[derive(Debug, Clone, Copy)]
pub struct RoleContext {
    pub champion: bool,
    /// 1-based rank among at-large teams by score descending (worst first)
    pub at_large_rank: Option<usize>,
    pub at_large_count: usize,
}

struct RoleRule {
    applies: fn(&RoleContext) -> bool,
    role: PlayInRole,
}

/// Evaluated top to bottom; the first match wins, otherwise `Standard`.
/// A float is only assigned when its anchor exists.
const ROLE_RULES: [RoleRule; 5] = [
    RoleRule {
        applies: |c: &RoleContext| c.champion,
        role: PlayInRole::Champion,
    },
    RoleRule {
        applies: |c: &RoleContext| c.at_large_rank == Some(2) && c.at_large_count >= 3,
        role: PlayInRole::Float2,
    },
    RoleRule {
        applies: |c: &RoleContext| c.at_large_rank == Some(3),
        role: PlayInRole::Anchor2,
    },
    RoleRule {
        applies: |c: &RoleContext| c.at_large_rank == Some(4) && c.at_large_count >= 5,
        role: PlayInRole::Float1,
    },
    RoleRule {
        applies: |c: &RoleContext| c.at_large_rank == Some(5),
        role: PlayInRole::Anchor1,
    },
];

pub fn play_in_role(ctx: &RoleContext) -> PlayInRole {
    ROLE_RULES
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .map_or(PlayInRole::Standard, |rule| rule.role)
}

/// Seed line of a compacted rank: four ranks per line, overflow on the last line
pub fn seed_for_rank(rank: usize) -> u8 {
    let line = (rank.max(1) + TEAMS_PER_LINE - 1) / TEAMS_PER_LINE;
    line.min(SEED_LINES as usize) as u8
}

/// One predicted-selected team of a season
#[derive(Debug, Clone, PartialEq)]
pub struct SeedCandidate<'a> {
    pub team: &'a str,
    /// Continuous seed estimate; lower is more favourable
    pub score: f64,
    pub champion: bool,
}

/// Seed and play-in role for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedAssignment {
    pub seed: u8,
    pub role: PlayInRole,
}

fn by_score<'a>(candidates: &'a [SeedCandidate<'a>]) -> impl Fn(&usize, &usize) -> Ordering + 'a {
    move |&a, &b| {
        candidates[a]
            .score
            .partial_cmp(&candidates[b].score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| candidates[a].team.cmp(candidates[b].team))
    }
}

/// Turn one season's scores into seeds.
///
/// Output is aligned with `candidates`. Every candidate receives a seed in
/// `1..=16`.
pub fn assign_seeds(candidates: &[SeedCandidate<'_>]) -> Vec<SeedAssignment> {
    let n = candidates.len();
    let cmp = by_score(candidates);

    // At-large ranking, worst score first
    let mut at_large: Vec<usize> = (0..n).filter(|&i| !candidates[i].champion).collect();
    at_large.sort_by(|a, b| cmp(b, a));
    let mut at_large_rank = vec![None; n];
    for (rank, &i) in at_large.iter().enumerate() {
        at_large_rank[i] = Some(rank + 1);
    }

    let roles: Vec<PlayInRole> = (0..n)
        .map(|i| {
            play_in_role(&RoleContext {
                champion: candidates[i].champion,
                at_large_rank: at_large_rank[i],
                at_large_count: at_large.len(),
            })
        })
        .collect();

    // Compacted rank over everyone but the floats, best score first
    let mut compact: Vec<usize> = (0..n).filter(|&i| !roles[i].is_float()).collect();
    compact.sort_by(&cmp);
    let mut seeds = vec![0u8; n];
    let mut compact_rank = vec![0usize; n];
    for (rank, &i) in compact.iter().enumerate() {
        compact_rank[i] = rank + 1;
        seeds[i] = seed_for_rank(rank + 1);
    }

    for i in 0..n {
        let (Some(anchor_role), Some(p)) = (roles[i].anchor(), roles[i].band_quantile()) else {
            continue;
        };
        let anchor_rank = (0..n)
            .find(|&j| roles[j] == anchor_role)
            .map_or(compact.len(), |j| compact_rank[j]);
        // The anchor and the three ranks just ahead of it
        let band: Vec<f64> = (anchor_rank.saturating_sub(TEAMS_PER_LINE - 1).max(1)..=anchor_rank)
            .map(|r| f64::from(seed_for_rank(r)))
            .collect();
        let seed = quantile_type7(&band, p).round() as u8;
        seeds[i] = seed.clamp(1, SEED_LINES);
    }

    roles
        .into_iter()
        .zip(seeds)
        .map(|(role, seed)| SeedAssignment { seed, role })
        .collect()
}

/// Stage-2 output for one table row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedPrediction {
    /// Index into [`SeasonTable::rows`]
    pub row: usize,
    pub score: f64,
    pub seed: u8,
    pub role: PlayInRole,
}

/// Leave-one-season-out seed regression
pub struct Ranker {
    tuner: Tuner,
}

impl Ranker {
    pub fn new(tuner: Tuner) -> Self {
        Self { tuner }
    }

    /// Regression on the committee seed. The selection label is a constant
    /// among training rows and is dropped with the bookkeeping columns.
    pub fn task() -> FitTask {
        FitTask::new(SEED, TaskMode::Regression, Metric::Rmse)
            .with_excluded(&[TEAM, SEASON, FOLD, MADE_TOURNAMENT])
    }

    /// Seed every row flagged in `selected` (aligned with the table rows).
    ///
    /// Training rows are committee-selected teams of the other seasons.
    pub fn run(
        &self,
        table: &SeasonTable,
        partition: &FoldPartition,
        selected: &[bool],
    ) -> Result<(Vec<SeedPrediction>, Vec<FoldReport>)> {
        if selected.len() != table.len() {
            return Err(BracketError::ShapeError {
                expected: format!("{} selection flags", table.len()),
                actual: format!("{} selection flags", selected.len()),
            });
        }

        let per_fold = rotate("seeding", partition, |split| self.run_fold(table, split, selected))?;

        let mut predictions = Vec::new();
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
        selected: &[bool],
    ) -> Result<(Vec<SeedPrediction>, FoldReport)> {
        let rows = table.rows();
        let train: Vec<&TeamSeason> = split
            .train
            .iter()
            .map(|&i| &rows[i])
            .filter(|r| r.made_tournament && r.seed.is_some())
            .collect();
        let test_idx: Vec<usize> = split.test.iter().copied().filter(|&i| selected[i]).collect();
        let test: Vec<&TeamSeason> = test_idx.iter().map(|&i| &rows[i]).collect();

        let model = self.tuner.tune_and_fit(&table.frame(&train)?, &Self::task())?;

        let predictions = if test.is_empty() {
            Vec::new()
        } else {
            let scores = model.predict(&table.frame(&test)?)?;
            let candidates: Vec<SeedCandidate<'_>> = test
                .iter()
                .zip(scores.iter())
                .map(|(row, &score)| SeedCandidate {
                    team: &row.team,
                    score,
                    champion: row.conference_champion,
                })
                .collect();
            let assignments = assign_seeds(&candidates);
            for (candidate, a) in candidates.iter().zip(&assignments) {
                if a.role != PlayInRole::Standard && a.role != PlayInRole::Champion {
                    debug!(season = split.season, team = candidate.team, role = %a.role, seed = a.seed, "Play-in slot");
                }
            }
            test_idx
                .iter()
                .zip(scores.iter())
                .zip(assignments)
                .map(|((&row, &score), a)| SeedPrediction {
                    row,
                    score,
                    seed: a.seed,
                    role: a.role,
                })
                .collect()
        };

        info!(
            season = split.season,
            fold = split.fold,
            seeded = predictions.len(),
            train_rows = train.len(),
            "Seed lines assigned"
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
