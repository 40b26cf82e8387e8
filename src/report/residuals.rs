//! Seed residuals (predicted minus committee seed)

use crate::pipeline::PredictionSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One committee-selected team the model also seeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub season: i32,
    pub team: String,
    pub seed: u8,
    pub predicted_seed: u8,
    pub residual: i32,
}

/// Residual spread of one committee seed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualLine {
    pub seed: u8,
    pub count: usize,
    pub mean: f64,
    pub min: i32,
    pub max: i32,
}

pub fn residuals(predictions: &PredictionSet) -> Vec<Residual> {
    predictions
        .records()
        .iter()
        .filter(|r| r.made_tournament)
        .filter_map(|r| {
            let (seed, predicted_seed) = (r.seed?, r.predicted_seed?);
            Some(Residual {
                season: r.season,
                team: r.team.clone(),
                seed,
                predicted_seed,
                residual: i32::from(predicted_seed) - i32::from(seed),
            })
        })
        .collect()
}

pub fn residual_lines(predictions: &PredictionSet) -> Vec<ResidualLine> {
    let mut by_seed: BTreeMap<u8, Vec<i32>> = BTreeMap::new();
    for r in residuals(predictions) {
        by_seed.entry(r.seed).or_default().push(r.residual);
    }
    by_seed
        .into_iter()
        .map(|(seed, values)| ResidualLine {
            seed,
            count: values.len(),
            mean: values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64,
            min: values.iter().copied().min().unwrap_or(0),
            max: values.iter().copied().max().unwrap_or(0),
        })
        .collect()
}
