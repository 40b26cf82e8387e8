//! Stage-2 seed error against the committee

use crate::pipeline::{PredictionRecord, PredictionSet};
use serde::{Deserialize, Serialize};

/// Squared seed error over a set of teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedError {
    /// Committee-selected teams that also carry a predicted seed
    pub n: usize,
    /// Committee-selected teams the model left out of its field
    pub unseeded: usize,
    pub mse: Option<f64>,
    pub rmse: Option<f64>,
}

impl SeedError {
    fn from_records<'a>(records: impl Iterator<Item = &'a PredictionRecord>) -> Self {
        let mut n = 0usize;
        let mut unseeded = 0usize;
        let mut sum_sq = 0.0;
        for r in records {
            let Some(actual) = r.seed.filter(|_| r.made_tournament) else {
                continue;
            };
            match r.predicted_seed {
                Some(predicted) => {
                    let diff = f64::from(predicted) - f64::from(actual);
                    sum_sq += diff * diff;
                    n += 1;
                }
                None => unseeded += 1,
            }
        }
        let mse = (n > 0).then(|| sum_sq / n as f64);
        Self {
            n,
            unseeded,
            mse,
            rmse: mse.map(f64::sqrt),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSeedError {
    pub season: i32,
    pub error: SeedError,
}

/// Per-season and pooled seed error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedErrorReport {
    pub seasons: Vec<SeasonSeedError>,
    /// Pooled over every team, not averaged over seasons
    pub overall: SeedError,
}

pub fn seed_error_report(predictions: &PredictionSet) -> SeedErrorReport {
    let seasons = predictions
        .seasons()
        .into_iter()
        .map(|season| SeasonSeedError {
            season,
            error: SeedError::from_records(predictions.season(season)),
        })
        .collect();
    SeedErrorReport {
        seasons,
        overall: SeedError::from_records(predictions.records().iter()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::tests::record;

    fn seeded(team: &str, season: i32, actual: u8, predicted: Option<u8>) -> PredictionRecord {
        let mut r = record(team, season, true, Some(actual));
        r.selected = predicted.is_some();
        r.predicted_seed = predicted;
        r
    }

    #[test]
    fn test_mse_matches_naive_computation() {
        let set = PredictionSet::new(vec![
            seeded("A", 2017, 1, Some(2)),
            seeded("B", 2017, 5, Some(5)),
            seeded("C", 2018, 10, Some(13)),
            seeded("D", 2018, 16, None),
            record("E", 2018, false, None),
        ]);
        let report = seed_error_report(&set);

        let pairs = [(1.0, 2.0), (5.0, 5.0), (10.0, 13.0)];
        let naive: f64 =
            pairs.iter().map(|(a, p): &(f64, f64)| (a - p).powi(2)).sum::<f64>() / pairs.len() as f64;
        let mse = report.overall.mse.unwrap();
        assert!((mse - naive).abs() < 1e-12);
        assert!((report.overall.rmse.unwrap() - naive.sqrt()).abs() < 1e-12);
        assert_eq!(report.overall.unseeded, 1);

        assert_eq!(report.seasons[0].error.mse, Some(0.5));
        assert_eq!(report.seasons[1].error.mse, Some(9.0));
        assert_eq!(report.seasons[1].error.n, 1);
    }

    #[test]
    fn test_empty_season_has_no_error() {
        let set = PredictionSet::new(vec![record("E", 2018, false, None)]);
        let report = seed_error_report(&set);
        assert_eq!(report.overall.mse, None);
    }
}
