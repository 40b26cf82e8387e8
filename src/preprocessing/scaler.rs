//! Standardisation of continuous predictors

use crate::error::{BracketError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters fitted for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: f64,
    /// Sample standard deviation; 1.0 for constant or single-valued columns
    pub std: f64,
}

/// Z-score scaler: (x - mean) / std, with parameters fit on training rows only.
///
/// Nulls are ignored while fitting and stay null when transforming.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| BracketError::ColumnNotFound(col_name.clone()))?;
            let series = column
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;

            let params = Self::compute_params(&series)?;
            self.params.push((col_name.clone(), params));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the fitted columns, leaving all others untouched
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(BracketError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| BracketError::ColumnNotFound(col_name.clone()))?;
                Self::scale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result
                .with_column(scaled)
                .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Fitted parameters of a column
    pub fn params(&self, column: &str) -> Option<&ScalerParams> {
        self.params
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| p)
    }

    fn compute_params(series: &Series) -> Result<ScalerParams> {
        let ca = series
            .f64()
            .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;

        let mean = ca.mean().unwrap_or(0.0);
        let std = ca.std(1).unwrap_or(1.0);
        Ok(ScalerParams {
            mean,
            std: if std == 0.0 || !std.is_finite() { 1.0 } else { std },
        })
    }

    fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let cast = series
            .cast(&DataType::Float64)
            .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;
        let ca = cast
            .f64()
            .map_err(|e| BracketError::PreprocessingError(e.to_string()))?;

        let scaled: Float64Chunked = ca
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.mean) / params.std))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}
