//! Data preprocessing module
//!
//! Provides the preprocessing applied identically in both stages:
//! - Leakage-column removal
//! - Feature scaling (z-score, fit on training rows)
//! - Categorical one-hot encoding

mod encoder;
mod recipe;
mod scaler;

pub use encoder::OneHotEncoder;
pub use recipe::{frame_to_array, target_vector, Recipe};
pub use scaler::{ScalerParams, StandardScaler};
