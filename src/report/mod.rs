//! Presentation of a finished run: console tables and file artefacts

mod artifacts;
mod console;
mod residuals;
pub(crate) mod style;

pub use artifacts::{
    games_frame, predictions_frame, residuals_frame, write_artifacts, GAMES_FILE, PREDICTIONS_FILE,
    RESIDUALS_FILE, SUMMARY_FILE,
};
pub use console::{print_glossary, print_report};
pub use residuals::{residual_lines, residuals, Residual, ResidualLine};
