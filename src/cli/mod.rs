//! Bracketology CLI Module
//!
//! Command-line interface for running the pipeline and inspecting inputs.

use clap::{Parser, Subcommand};
use colored::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::{load_games, validate_games, DataLoader, FeatureStore, SeasonTable};
use crate::evaluation::evaluate;
use crate::pipeline::{FoldPartition, Pipeline, PipelineConfig};
use crate::report::style::{dim, kv, muted, section, step_done, step_ok, step_run};
use crate::report::{print_report, write_artifacts};

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bracketology")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Predict tournament selection and seeding from team resumes")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run both stages over every season and compare against the committee
    Run {
        /// Team-season table (CSV or TSV)
        #[arg(short, long)]
        teams: PathBuf,

        /// Tournament game results (CSV or TSV)
        #[arg(short, long)]
        games: PathBuf,

        /// JSON config; omitted sections keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for predictions, residuals, games and summary files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the ensemble size
        #[arg(long)]
        n_estimators: Option<usize>,
    },

    /// Show seasons, folds and committee selections of a team table
    Info {
        /// Team-season table (CSV or TSV)
        #[arg(short, long)]
        teams: PathBuf,

        /// JSON config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as JSON
    Config,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::from_json_file(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_table(path: &Path, config: &PipelineConfig) -> anyhow::Result<SeasonTable> {
    step_run("Loading teams");
    let start = Instant::now();
    let raw = DataLoader::new().load(path)?;
    let table = FeatureStore::new(config.data.clone()).load_and_filter(&raw)?;
    step_done(&format!(
        "{} of {} rows kept in {:?}",
        table.len(),
        raw.height(),
        start.elapsed()
    ));
    Ok(table)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_run(
    teams: &Path,
    games: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    n_estimators: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    if let Some(n) = n_estimators {
        config.tuning = config.tuning.with_n_estimators(n);
    }

    section("Run");
    println!("  {}", kv("Teams  ", &teams.display().to_string()));
    println!("  {}", kv("Games  ", &games.display().to_string()));
    println!(
        "  {}",
        kv(
            "Depths ",
            &format!(
                "{:?} · {} trees · {}-fold CV",
                config.tuning.depth_grid(),
                config.tuning.n_estimators,
                config.tuning.cv_folds
            )
        )
    );
    println!();

    let table = load_table(teams, &config)?;

    step_run("Loading games");
    let raw_games = DataLoader::new().load(games)?;
    let results = load_games(&raw_games, &config.data.game_columns)?;
    validate_games(&table, &results)?;
    step_done(&format!("{} games", results.len()));

    step_run("Fitting both stages");
    let start = Instant::now();
    let pipeline = Pipeline::new(config.clone());
    let out = pipeline.run(&table)?;
    step_done(&format!(
        "{} seasons in {:.1}s",
        out.predictions.seasons().len(),
        start.elapsed().as_secs_f64()
    ));

    step_run("Evaluating");
    let evaluation = evaluate(&out.predictions, &results)?;
    step_done(&format!("{} games scored", evaluation.tournament.games.len()));

    if let Some(dir) = output {
        let written = write_artifacts(dir, &out, &evaluation)?;
        step_ok(&format!("{} files written to {}", written.len(), dir.display()));
    }

    print_report(&config.data, &out, &evaluation);
    Ok(())
}

pub fn cmd_info(teams: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    section("Team table");
    let table = load_table(teams, &config)?;
    let partition = FoldPartition::from_table(&table)?;

    println!();
    println!("  {:<12} {}", muted("Numeric"), table.numeric_columns().join(", "));
    println!("  {:<12} {}", muted("Categorical"), table.categorical_columns().join(", "));
    println!();

    let mut champions: BTreeMap<i32, usize> = BTreeMap::new();
    for row in table.rows().iter().filter(|r| r.conference_champion) {
        *champions.entry(row.season).or_insert(0) += 1;
    }

    println!(
        "  {:<8} {:>6} {:>7} {:>9} {:>10}",
        muted("Season"),
        muted("Fold"),
        muted("Teams"),
        muted("Selected"),
        muted("Champions")
    );
    println!("  {}", dim(&"─".repeat(44)));
    for split in partition.splits() {
        let rows = table.season_rows(split.season);
        let selected = rows.iter().filter(|r| r.made_tournament).count();
        let selected = if selected == config.data.field_size {
            selected.to_string().white()
        } else {
            selected.to_string().yellow()
        };
        println!(
            "  {:<8} {:>6} {:>7} {:>9} {:>10}",
            split.season,
            split.fold,
            rows.len(),
            selected,
            champions.get(&split.season).copied().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

pub fn cmd_config() -> anyhow::Result<()> {
    println!("{}", PipelineConfig::default().to_json()?);
    Ok(())
}
