//! Console rendering of a finished run

use super::residuals::residual_lines;
use super::style::{bar, dim, fmt_opt, muted, section, warn, RULE};
use crate::data::DataConfig;
use crate::evaluation::Evaluation;
use crate::pipeline::{PipelineOutput, StageSummary};
use colored::*;

const IMPORTANCE_ROWS: usize = 10;
const BAR_WIDTH: usize = 24;

/// Print every table of the run
pub fn print_report(config: &DataConfig, output: &PipelineOutput, evaluation: &Evaluation) {
    print_glossary(config);
    print_stage("Stage 1 · selection folds", &output.selection, "accuracy");
    print_stage("Stage 2 · seeding folds", &output.seeding, "rmse");
    print_misclassification(evaluation);
    print_seed_error(evaluation);
    print_tournament(evaluation);
    print_importances("Variable importance · selection", &output.selection);
    print_importances("Variable importance · seeding", &output.seeding);
    print_residuals(output);
    println!();
}

pub fn print_glossary(config: &DataConfig) {
    section("Predictors");
    for p in config.numeric_predictors.iter().chain(config.categorical_predictors.iter()) {
        println!("  {:<16} {}", p.column.white(), muted(&p.description));
    }
}

fn print_stage(title: &str, stage: &StageSummary, metric: &str) {
    section(title);
    println!(
        "  {:<8} {:>6} {:>7} {:>6} {:>6} {:>10}",
        muted("Season"),
        muted("Fold"),
        muted("Train"),
        muted("Test"),
        muted("Depth"),
        muted(metric)
    );
    for f in &stage.folds {
        println!(
            "  {:<8} {:>6} {:>7} {:>6} {:>6} {:>10.4}",
            f.season, f.fold, f.train_rows, f.test_rows, f.depth, f.cv_score
        );
    }
}

fn print_misclassification(evaluation: &Evaluation) {
    let c = &evaluation.classification;
    section("Selection");
    println!(
        "  {:<8} {:>6} {:>9} {:>9} {:>5} {:>5}",
        muted("Season"),
        muted("Teams"),
        muted("Model"),
        muted("Committee"),
        muted("FN"),
        muted("FP")
    );
    for s in &c.seasons {
        println!(
            "  {:<8} {:>6} {:>9} {:>9} {:>5} {:>5}",
            s.season,
            s.teams,
            s.predicted_selected,
            s.committee_selected,
            s.false_negatives.len(),
            s.false_positives.len()
        );
        if !s.false_negatives.is_empty() {
            println!("  {:<8} {}", "", dim(&format!("missed: {}", s.false_negatives.join(", "))));
        }
    }
    println!("  {}", dim(&"─".repeat(RULE)));
    println!(
        "  {:<16} {}",
        muted("Accuracy"),
        format!("{:.4}", c.accuracy).white().bold()
    );
    println!("  {:<16} {}", muted("Missed teams"), c.false_negative_total());
}

fn print_seed_error(evaluation: &Evaluation) {
    let e = &evaluation.seed_error;
    section("Seed error");
    println!(
        "  {:<8} {:>6} {:>9} {:>8} {:>8}",
        muted("Season"),
        muted("Teams"),
        muted("Unseeded"),
        muted("MSE"),
        muted("RMSE")
    );
    for s in &e.seasons {
        println!(
            "  {:<8} {:>6} {:>9} {:>8} {:>8}",
            s.season,
            s.error.n,
            s.error.unseeded,
            fmt_opt(s.error.mse, 3),
            fmt_opt(s.error.rmse, 3)
        );
    }
    println!("  {}", dim(&"─".repeat(RULE)));
    println!(
        "  {:<8} {:>6} {:>9} {:>8} {:>8}",
        "All".white().bold(),
        e.overall.n,
        e.overall.unseeded,
        fmt_opt(e.overall.mse, 3),
        fmt_opt(e.overall.rmse, 3)
    );
}

fn print_tournament(evaluation: &Evaluation) {
    let t = &evaluation.tournament.summary;
    section("Tournament games");
    println!("  {:<12} {:>7} {:>10} {:>11}", muted(""), muted("Games"), muted("Accuracy"), muted("Mean error"));
    println!(
        "  {:<12} {:>7} {:>10} {:>11}",
        "Model",
        t.model_games,
        fmt_opt(t.model_accuracy, 4),
        fmt_opt(t.model_mean_error, 3)
    );
    println!(
        "  {:<12} {:>7} {:>10} {:>11}",
        "Committee",
        t.committee_games,
        fmt_opt(t.committee_accuracy, 4),
        fmt_opt(t.committee_mean_error, 3)
    );
    println!(
        "  {}",
        dim(&format!("{} games, {} play-ins excluded", t.games, t.play_in_games))
    );
}

fn print_importances(title: &str, stage: &StageSummary) {
    section(title);
    let max = stage.importances.first().map_or(0.0, |(_, v)| *v);
    for (name, value) in stage.importances.iter().take(IMPORTANCE_ROWS) {
        println!(
            "  {:<22} {:>6.3} {}",
            name,
            value,
            bar(*value, max, BAR_WIDTH).truecolor(120, 170, 255)
        );
    }
    if stage.importances.len() > IMPORTANCE_ROWS {
        println!("  {}", dim(&format!("{} more", stage.importances.len() - IMPORTANCE_ROWS)));
    }
}

fn print_residuals(output: &PipelineOutput) {
    section("Seed residuals by committee line");
    println!(
        "  {:<6} {:>6} {:>9} {:>6} {:>6}",
        muted("Seed"),
        muted("Teams"),
        muted("Mean"),
        muted("Min"),
        muted("Max")
    );
    for line in residual_lines(&output.predictions) {
        let mean = format!("{:+.2}", line.mean);
        let mean = if line.mean.abs() >= 2.0 { warn(&mean) } else { mean.white() };
        println!(
            "  {:<6} {:>6} {:>9} {:>6} {:>6}",
            line.seed, line.count, mean, line.min, line.max
        );
    }
}
