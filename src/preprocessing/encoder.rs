//! One-hot encoding of categorical predictors

use crate::error::{BracketError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One-hot encoder with levels learned from training rows.
///
/// Each fitted column `c` with level `l` becomes an indicator column `c_l`.
/// A null category yields nulls in every indicator; a level unseen during
/// fitting yields zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// column name -> sorted levels
    levels: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the levels of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.levels.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BracketError::ColumnNotFound(col_name.clone()))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;

            let levels: BTreeSet<String> = ca.into_iter().flatten().map(str::to_string).collect();
            self.levels.push((col_name.clone(), levels.into_iter().collect()));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace every fitted column by its indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BracketError::ModelNotFitted);
        }

        let mut result = df.clone();

        for (col_name, levels) in &self.levels {
            let column = df
                .column(col_name)
                .map_err(|_| BracketError::ColumnNotFound(col_name.clone()))?;
            let ca = column
                .as_materialized_series()
                .str()
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;

            let unseen: BTreeSet<&str> = ca
                .into_iter()
                .flatten()
                .filter(|v| !levels.iter().any(|l| l == v))
                .collect();
            if !unseen.is_empty() {
                debug!(column = %col_name, levels = ?unseen, "Levels unseen during fitting encode as zeros");
            }

            for level in levels {
                let values: Vec<Option<f64>> = ca
                    .into_iter()
                    .map(|v| v.map(|v| if v == level { 1.0 } else { 0.0 }))
                    .collect();
                let indicator = Series::new(Self::indicator_name(col_name, level).into(), values);
                result
                    .with_column(indicator)
                    .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
            }

            result = result
                .drop(col_name)
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Names of the indicator columns, in output order
    pub fn output_columns(&self) -> Vec<String> {
        self.levels
            .iter()
            .flat_map(|(col, levels)| levels.iter().map(move |l| Self::indicator_name(col, l)))
            .collect()
    }

    fn indicator_name(column: &str, level: &str) -> String {
        format!("{}_{}", column, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols() -> Vec<String> {
        vec!["conf".to_string()]
    }

    #[test]
    fn test_onehot_levels_sorted() {
        let df = df!("conf" => &["runner_up", "champion", "champion"]).unwrap();
        let mut enc = OneHotEncoder::new();
        let out = enc.fit_transform(&df, &cols()).unwrap();

        assert_eq!(enc.output_columns(), vec!["conf_champion", "conf_runner_up"]);
        assert!(out.column("conf").is_err());
        let champ = out.column("conf_champion").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_eq!(champ.into_iter().collect::<Vec<_>>(), vec![Some(0.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_unseen_level_is_all_zero() {
        let train = df!("conf" => &["champion", "runner_up"]).unwrap();
        let test = df!("conf" => &["semifinal"]).unwrap();

        let mut enc = OneHotEncoder::new();
        enc.fit(&train, &cols()).unwrap();
        let out = enc.transform(&test).unwrap();

        for name in enc.output_columns() {
            let col = out.column(&name).unwrap().as_materialized_series().f64().unwrap().clone();
            assert_eq!(col.get(0), Some(0.0));
        }
    }

    #[test]
    fn test_null_category_propagates() {
        let df = df!("conf" => &[Some("champion"), None]).unwrap();
        let mut enc = OneHotEncoder::new();
        let out = enc.fit_transform(&df, &cols()).unwrap();
        let col = out.column("conf_champion").unwrap().as_materialized_series().f64().unwrap().clone();
        assert_eq!(col.get(1), None);
    }
}
