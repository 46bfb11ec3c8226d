//! Prediction and inference
//!
//! Run the loaded model over assembled features and render the results.

pub mod inference;
pub mod report;

pub use inference::Predictor;
pub use report::{PredictionReport, RowOutcome};
