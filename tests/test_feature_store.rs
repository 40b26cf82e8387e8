//! Integration test: CSV on disk → loader → feature store

use bracketology::data::{load_games, DataConfig, DataLoader, FeatureStore, PredictorSpec};
use bracketology::BracketError;
use std::io::Write;
use std::path::PathBuf;

fn config() -> DataConfig {
    DataConfig::default()
        .with_numeric_predictors(vec![
            PredictorSpec::new("net", "NET rank"),
            PredictorSpec::new("sor", "Strength of record rank"),
        ])
        .with_categorical_predictors(vec![PredictorSpec::new("conf_tourney", "Conference result")])
}

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

const TEAMS_CSV: &str = "\
team,season,eligible,made_tournament,seed,net,sor,conf_tourney,ap_rank
Alpha,2017,true,1,1,3,2,champion,1
Beta,2017,true,1,9,40,35,semifinal,
Gamma,2017,false,0,,120,140,early_exit,
Delta,2018,true,0,,75,,early_exit,
Alpha,2018,true,1,2,6,4,final,5
Omega,2020,true,1,3,8,9,champion,4
Beta,2021,true,1,16,150,160,champion,
";

#[test]
fn test_csv_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "teams.csv", TEAMS_CSV);

    let raw = DataLoader::new().load(&path).unwrap();
    assert_eq!(raw.height(), 7);

    let table = FeatureStore::new(config()).load_and_filter(&raw).unwrap();

    // Gamma is ineligible, Omega played in the cancelled season
    assert_eq!(table.len(), 5);
    assert_eq!(table.seasons(), vec![2017, 2018, 2021]);
    assert_eq!(table.numeric_columns(), &["net".to_string(), "sor".to_string()]);
    assert_eq!(table.categorical_columns(), &["conf_tourney".to_string()]);

    let beta_2021 = table
        .rows()
        .iter()
        .find(|r| r.team == "Beta" && r.season == 2021)
        .unwrap();
    assert_eq!(beta_2021.fold, 4);
    assert_eq!(beta_2021.seed, Some(16));
    assert!(beta_2021.conference_champion);

    let delta = table.rows().iter().find(|r| r.team == "Delta").unwrap();
    assert_eq!(delta.fold, 2);
    assert_eq!(delta.numeric, vec![Some(75.0), None]);
    assert!(!delta.made_tournament);
}

#[test]
fn test_unlisted_columns_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "teams.csv", TEAMS_CSV);
    let raw = DataLoader::new().load(&path).unwrap();
    let table = FeatureStore::new(config()).load_and_filter(&raw).unwrap();

    let rows: Vec<_> = table.rows().iter().collect();
    let frame = table.frame(&rows).unwrap();
    assert!(frame.column("ap_rank").is_err());
    assert!(frame.column("net").is_ok());
}

#[test]
fn test_tsv_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "teams.tsv", &TEAMS_CSV.replace(',', "\t"));
    let raw = DataLoader::new().load(&path).unwrap();
    assert_eq!(raw.width(), 9);
}

#[test]
fn test_out_of_range_seed_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "\
team,season,eligible,made_tournament,seed,net,sor,conf_tourney
Alpha,2019,1,1,17,3,2,champion
";
    let path = write_file(&dir, "teams.csv", csv);
    let raw = DataLoader::new().load(&path).unwrap();
    let result = FeatureStore::new(config()).load_and_filter(&raw);
    assert!(matches!(result, Err(BracketError::ValidationError(_))));
}

#[test]
fn test_missing_predictor_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "\
team,season,eligible,made_tournament,seed,net,conf_tourney
Alpha,2019,1,1,1,3,champion
";
    let path = write_file(&dir, "teams.csv", csv);
    let raw = DataLoader::new().load(&path).unwrap();
    let result = FeatureStore::new(config()).load_and_filter(&raw);
    assert!(matches!(result, Err(BracketError::ColumnNotFound(c)) if c == "sor"));
}

#[test]
fn test_games_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "\
season,team_1,team_2,team_1_won
2017,Alpha,Beta,1
2018,Alpha,Delta,0
";
    let path = write_file(&dir, "games.csv", csv);
    let raw = DataLoader::new().load(&path).unwrap();
    let games = load_games(&raw, &config().game_columns).unwrap();

    assert_eq!(games.len(), 2);
    assert_eq!(games[0].winner(), "Alpha");
    assert_eq!(games[1].winner(), "Delta");
}
