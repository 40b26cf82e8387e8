//! Error types for the selection and seeding pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BracketError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum BracketError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Required column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Fold {fold} (season {season}) failed: {source}")]
    FoldFailed {
        fold: usize,
        season: i32,
        #[source]
        source: Box<BracketError>,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for BracketError {
    fn from(err: polars::error::PolarsError) -> Self {
        BracketError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BracketError {
    fn from(err: serde_json::Error) -> Self {
        BracketError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BracketError {
    fn from(err: ndarray::ShapeError) -> Self {
        BracketError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
