//! Integration test: feature store → both stages → evaluation → artefacts

use bracketology::data::{
    validate_games, DataConfig, FeatureStore, GameResult, PredictorSpec, SeasonTable,
};
use bracketology::evaluation::evaluate;
use bracketology::pipeline::{Pipeline, PipelineConfig, PlayInRole};
use bracketology::report::write_artifacts;
use bracketology::training::TuningConfig;
use polars::prelude::*;

const SEASONS: [i64; 7] = [2017, 2018, 2019, 2021, 2022, 2023, 2024];
const TEAMS: usize = 80;

/// Committee seed of the team at 1-based strength rank `r`
fn committee_seed(r: usize) -> Option<f64> {
    match r {
        1..=64 => Some(((r + 3) / 4) as f64),
        65 | 66 => Some(11.0),
        67 | 68 => Some(16.0),
        _ => None,
    }
}

fn synthetic_teams() -> DataFrame {
    let mut team = Vec::new();
    let mut season = Vec::new();
    let mut eligible = Vec::new();
    let mut made = Vec::new();
    let mut seed = Vec::new();
    let mut net = Vec::new();
    let mut sor = Vec::new();
    let mut conf = Vec::new();

    for &s in &SEASONS {
        for i in 0..TEAMS {
            let rank = i + 1;
            let noise = ((i * 13 + s as usize * 7) % 9) as f64 - 4.0;
            team.push(format!("Team {:02}", i));
            season.push(s);
            eligible.push(true);
            made.push(if rank <= 68 { 1i64 } else { 0 });
            seed.push(committee_seed(rank));
            net.push(rank as f64 * 4.0 + noise);
            sor.push(rank as f64 * 4.0 - noise);
            conf.push(match (rank <= 68, i % 3 == 0) {
                (true, true) => "champion",
                (true, false) => "semifinal",
                _ => "early_exit",
            });
        }
    }

    df!(
        "team" => team,
        "season" => season,
        "eligible" => eligible,
        "made_tournament" => made,
        "seed" => seed,
        "net" => net,
        "sor" => sor,
        "conf_tourney" => conf
    )
    .unwrap()
}

fn data_config() -> DataConfig {
    DataConfig::default()
        .with_numeric_predictors(vec![
            PredictorSpec::new("net", "NET rank"),
            PredictorSpec::new("sor", "Strength of record rank"),
        ])
        .with_categorical_predictors(vec![PredictorSpec::new("conf_tourney", "Conference result")])
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig::new().with_data(data_config()).with_tuning(
        TuningConfig::default()
            .with_n_estimators(20)
            .with_depth_range(2, 3)
            .with_grid_levels(2)
            .with_cv(3, 1),
    )
}

fn table() -> SeasonTable {
    FeatureStore::new(data_config())
        .load_and_filter(&synthetic_teams())
        .unwrap()
}

fn games() -> Vec<GameResult> {
    let game = |season: i64, a: usize, b: usize, a_won: bool| GameResult {
        season: season as i32,
        team_1: format!("Team {:02}", a),
        team_2: format!("Team {:02}", b),
        team_1_won: a_won,
    };
    let mut out = Vec::new();
    for &s in &SEASONS {
        out.push(game(s, 0, 67, true)); // 1 beats 16
        out.push(game(s, 10, 50, false)); // 3 loses to 13
        out.push(game(s, 64, 65, true)); // play-in on the 11 line
        out.push(game(s, 66, 67, true)); // play-in on the 16 line
    }
    out.push(game(2016, 0, 1, true)); // season without predictions
    out
}

#[test]
fn test_every_team_season_predicted_once() {
    let table = table();
    let output = Pipeline::new(pipeline_config()).run(&table).unwrap();

    assert_eq!(output.predictions.len(), SEASONS.len() * TEAMS);
    assert_eq!(output.selection.folds.len(), SEASONS.len());
    assert_eq!(output.seeding.folds.len(), SEASONS.len());

    let fold_seasons: Vec<i32> = output.selection.folds.iter().map(|f| f.season).collect();
    assert_eq!(fold_seasons, table.seasons());

    for report in &output.selection.folds {
        assert_eq!(report.test_rows, TEAMS);
        assert_eq!(report.train_rows, (SEASONS.len() - 1) * TEAMS);
        assert!(report.depth == 2 || report.depth == 3);
    }
}

#[test]
fn test_field_size_and_seed_range() {
    let output = Pipeline::new(pipeline_config()).run(&table()).unwrap();

    for season in output.predictions.seasons() {
        assert_eq!(output.predictions.selected_count(season), 68);
    }

    for record in output.predictions.records() {
        assert!((0.0..=1.0).contains(&record.selection_probability));
        if record.selected {
            let seed = record.predicted_seed.unwrap();
            assert!((1..=16).contains(&seed), "{} got seed {}", record.team, seed);
            assert!(record.play_in_role.is_some());
        } else {
            assert!(record.predicted_seed.is_none());
            assert!(record.seed_score.is_none());
        }
        if record.conference_champion && record.selected {
            assert_eq!(record.play_in_role, Some(PlayInRole::Champion));
        }
    }

    for season in output.predictions.seasons() {
        let floats = output
            .predictions
            .season(season)
            .filter(|r| r.play_in_role.map_or(false, |p| p.is_float()))
            .count();
        assert_eq!(floats, 2);
    }
}

#[test]
fn test_runs_are_reproducible() {
    let table = table();
    let pipeline = Pipeline::new(pipeline_config());
    let first = pipeline.run(&table).unwrap();
    let second = pipeline.run(&table).unwrap();
    assert_eq!(first.predictions.records(), second.predictions.records());
}

#[test]
fn test_evaluation_of_separable_seasons() {
    let output = Pipeline::new(pipeline_config()).run(&table()).unwrap();
    let evaluation = evaluate(&output.predictions, &games()).unwrap();

    assert!(evaluation.classification.accuracy > 0.9);
    assert_eq!(evaluation.classification.total, SEASONS.len() * TEAMS);

    let rmse = evaluation.seed_error.overall.rmse.unwrap();
    assert!(rmse < 4.0, "seed rmse {}", rmse);

    let summary = &evaluation.tournament.summary;
    assert_eq!(summary.games, SEASONS.len() * 4);
    assert_eq!(summary.play_in_games, SEASONS.len() * 2);
    assert_eq!(summary.committee_games, SEASONS.len() * 2);
    assert_eq!(summary.committee_accuracy, Some(0.5));
    assert_eq!(summary.committee_mean_error, Some(5.0));
}

#[test]
fn test_artifacts_from_full_run() {
    let output = Pipeline::new(pipeline_config()).run(&table()).unwrap();
    let evaluation = evaluate(&output.predictions, &games()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = write_artifacts(dir.path(), &output, &evaluation).unwrap();
    assert_eq!(written.len(), 4);

    let summary = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(value["seeding"]["folds"].as_array().unwrap().len(), SEASONS.len());
}

#[test]
fn test_single_season_cannot_rotate() {
    let raw = synthetic_teams()
        .lazy()
        .filter(col("season").eq(lit(2018i64)))
        .collect()
        .unwrap();
    let table = FeatureStore::new(data_config()).load_and_filter(&raw).unwrap();
    assert!(Pipeline::new(pipeline_config()).run(&table).is_err());
}

#[test]
fn test_game_teams_checked_before_fitting() {
    let table = table();
    assert!(validate_games(&table, &games()).is_ok());

    let mut bad = games();
    bad[0].team_2 = "Team 6 7".to_string();
    assert!(validate_games(&table, &bad).is_err());

    // Team 70 is in the table but was never seeded
    bad[0].team_2 = "Team 70".to_string();
    assert!(validate_games(&table, &bad).is_err());
}
