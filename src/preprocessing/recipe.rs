//! Preprocessing recipe shared by both stages
//!
//! A recipe is fit on training rows only: it drops the target and the
//! leakage columns, standardises every numeric predictor, one-hot encodes
//! every string predictor, and renders the result as a dense design matrix.

use super::encoder::OneHotEncoder;
use super::scaler::StandardScaler;
use crate::error::{BracketError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A fitted preprocessing recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    target: String,
    numeric: Vec<String>,
    categorical: Vec<String>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    feature_names: Vec<String>,
}

impl Recipe {
    /// Fit on a training frame.
    ///
    /// Every column other than `target` and `excluded` is a predictor: string
    /// columns are categorical, everything else numeric.
    pub fn fit(train: &DataFrame, target: &str, excluded: &[&str]) -> Result<Self> {
        if train.height() == 0 {
            return Err(BracketError::PreprocessingError(
                "cannot fit a recipe on zero rows".to_string(),
            ));
        }
        if train.column(target).is_err() {
            return Err(BracketError::ColumnNotFound(target.to_string()));
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        for column in train.get_columns() {
            let name = column.name().as_str();
            if name == target || excluded.contains(&name) {
                continue;
            }
            match column.dtype() {
                DataType::String => categorical.push(name.to_string()),
                _ => numeric.push(name.to_string()),
            }
        }

        if numeric.is_empty() && categorical.is_empty() {
            return Err(BracketError::PreprocessingError(
                "no predictors left after exclusions".to_string(),
            ));
        }

        let mut scaler = StandardScaler::new();
        scaler.fit(train, &numeric)?;
        let mut encoder = OneHotEncoder::new();
        encoder.fit(train, &categorical)?;

        let mut feature_names = numeric.clone();
        feature_names.extend(encoder.output_columns());

        Ok(Self {
            target: target.to_string(),
            numeric,
            categorical,
            scaler,
            encoder,
            feature_names,
        })
    }

    /// Design matrix for any frame with the training layout. Nulls become NaN.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let scaled = self.scaler.transform(df)?;
        let encoded = self.encoder.transform(&scaled)?;
        frame_to_array(&encoded, &self.feature_names)
    }

    /// Target vector of a frame; nulls are an error
    pub fn target(&self, df: &DataFrame) -> Result<Array1<f64>> {
        target_vector(df, &self.target)
    }

    /// Design-matrix column names, numeric predictors first
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn numeric_predictors(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_predictors(&self) -> &[String] {
        &self.categorical
    }
}

/// Extract a non-null f64 target column
pub fn target_vector(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target)
        .map_err(|_| BracketError::ColumnNotFound(target.to_string()))?;
    let cast = column
        .cast(&DataType::Float64)
        .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
    cast.as_materialized_series()
        .f64()
        .map_err(|e| BracketError::PreprocessingError(e.to_string()))?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                BracketError::PreprocessingError(format!("target '{}' is null in row {}", target, i))
            })
        })
        .collect()
}

/// Extract named columns into a row-major matrix, nulls as NaN
pub fn frame_to_array(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| BracketError::ColumnNotFound(col_name.clone()))?;
            let cast = column
                .cast(&DataType::Float64)
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
            let values: Vec<f64> = cast
                .as_materialized_series()
                .f64()
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> DataFrame {
        df!(
            "team" => &["A", "B", "C", "D"],
            "season" => &[2017i32, 2017, 2018, 2018],
            "net" => &[Some(1.0), Some(3.0), None, Some(5.0)],
            "conf" => &["champion", "early_exit", "champion", "runner_up"],
            "made_tournament" => &[1.0, 0.0, 1.0, 0.0]
        )
        .unwrap()
    }

    #[test]
    fn test_recipe_excludes_leakage_columns() {
        let recipe = Recipe::fit(&train(), "made_tournament", &["team", "season"]).unwrap();
        assert_eq!(
            recipe.feature_names(),
            &["net", "conf_champion", "conf_early_exit", "conf_runner_up"]
        );
    }

    #[test]
    fn test_recipe_matrix_standardised_with_nan_for_missing() {
        let df = train();
        let recipe = Recipe::fit(&df, "made_tournament", &["team", "season"]).unwrap();
        let x = recipe.transform(&df).unwrap();

        assert_eq!(x.dim(), (4, 4));
        assert!(x[[2, 0]].is_nan());
        // mean of (1, 3, 5) is 3
        assert!(x[[1, 0]].abs() < 1e-12);
        assert_eq!(x[[0, 1]], 1.0);
        assert_eq!(x[[1, 2]], 1.0);
    }

    #[test]
    fn test_target_nulls_rejected() {
        let df = df!("seed" => &[Some(1.0), None]).unwrap();
        assert!(target_vector(&df, "seed").is_err());
    }

    #[test]
    fn test_missing_target_column() {
        let result = Recipe::fit(&train(), "seed", &[]);
        assert!(matches!(result, Err(BracketError::ColumnNotFound(_))));
    }
}
