//! Run artefacts written to an output directory

use super::residuals::residuals;
use crate::data::DataSaver;
use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::pipeline::{PipelineOutput, StageSummary};
use polars::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const RESIDUALS_FILE: &str = "residuals.csv";
pub const GAMES_FILE: &str = "games.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Everything in `summary.json`
#[derive(Serialize)]
struct Summary<'a> {
    selection: &'a StageSummary,
    seeding: &'a StageSummary,
    evaluation: &'a Evaluation,
}

/// Write all artefacts, creating `dir` if needed. Returns the written paths.
pub fn write_artifacts(dir: &Path, output: &PipelineOutput, evaluation: &Evaluation) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(4);

    let path = dir.join(PREDICTIONS_FILE);
    DataSaver::save_csv(&mut predictions_frame(output)?, &path)?;
    written.push(path);

    let path = dir.join(RESIDUALS_FILE);
    DataSaver::save_csv(&mut residuals_frame(output)?, &path)?;
    written.push(path);

    let path = dir.join(GAMES_FILE);
    DataSaver::save_csv(&mut games_frame(evaluation)?, &path)?;
    written.push(path);

    let path = dir.join(SUMMARY_FILE);
    let summary = Summary {
        selection: &output.selection,
        seeding: &output.seeding,
        evaluation,
    };
    fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "Artefacts written");
    Ok(written)
}

pub fn predictions_frame(output: &PipelineOutput) -> Result<DataFrame> {
    let records = output.predictions.records();
    let df = df!(
        "season" => records.iter().map(|r| r.season).collect::<Vec<_>>(),
        "team" => records.iter().map(|r| r.team.as_str()).collect::<Vec<_>>(),
        "fold" => records.iter().map(|r| r.fold as i64).collect::<Vec<_>>(),
        "made_tournament" => records.iter().map(|r| r.made_tournament).collect::<Vec<_>>(),
        "seed" => records.iter().map(|r| r.seed.map(i32::from)).collect::<Vec<_>>(),
        "conference_champion" => records.iter().map(|r| r.conference_champion).collect::<Vec<_>>(),
        "selection_probability" => records.iter().map(|r| r.selection_probability).collect::<Vec<_>>(),
        "selected" => records.iter().map(|r| r.selected).collect::<Vec<_>>(),
        "seed_score" => records.iter().map(|r| r.seed_score).collect::<Vec<_>>(),
        "predicted_seed" => records.iter().map(|r| r.predicted_seed.map(i32::from)).collect::<Vec<_>>(),
        "play_in_role" => records.iter().map(|r| r.play_in_role.map(|p| p.as_str())).collect::<Vec<_>>()
    )?;
    Ok(df)
}

pub fn residuals_frame(output: &PipelineOutput) -> Result<DataFrame> {
    let rows = residuals(&output.predictions);
    let df = df!(
        "season" => rows.iter().map(|r| r.season).collect::<Vec<_>>(),
        "team" => rows.iter().map(|r| r.team.as_str()).collect::<Vec<_>>(),
        "seed" => rows.iter().map(|r| i32::from(r.seed)).collect::<Vec<_>>(),
        "predicted_seed" => rows.iter().map(|r| i32::from(r.predicted_seed)).collect::<Vec<_>>(),
        "residual" => rows.iter().map(|r| r.residual).collect::<Vec<_>>()
    )?;
    Ok(df)
}

pub fn games_frame(evaluation: &Evaluation) -> Result<DataFrame> {
    let games = &evaluation.tournament.games;
    let df = df!(
        "season" => games.iter().map(|g| g.season).collect::<Vec<_>>(),
        "winner" => games.iter().map(|g| g.winner.as_str()).collect::<Vec<_>>(),
        "loser" => games.iter().map(|g| g.loser.as_str()).collect::<Vec<_>>(),
        "committee_winner_seed" => games.iter().map(|g| i32::from(g.committee_winner_seed)).collect::<Vec<_>>(),
        "committee_loser_seed" => games.iter().map(|g| i32::from(g.committee_loser_seed)).collect::<Vec<_>>(),
        "model_winner_seed" => games.iter().map(|g| g.model_winner_seed.map(i32::from)).collect::<Vec<_>>(),
        "model_loser_seed" => games.iter().map(|g| g.model_loser_seed.map(i32::from)).collect::<Vec<_>>(),
        "play_in" => games.iter().map(|g| g.play_in).collect::<Vec<_>>(),
        "committee_result" => games.iter().map(|g| i32::from(g.committee.result)).collect::<Vec<_>>(),
        "committee_error" => games.iter().map(|g| g.committee.error).collect::<Vec<_>>(),
        "model_result" => games.iter().map(|g| g.model.map(|p| i32::from(p.result))).collect::<Vec<_>>(),
        "model_error" => games.iter().map(|g| g.model.map(|p| p.error)).collect::<Vec<_>>()
    )?;
    Ok(df)
}
