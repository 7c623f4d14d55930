//! Prediction and reporting
//!
//! Runs the train/predict pipelines and formats matchday predictions.

pub mod formatter;
pub mod inference;

pub use formatter::{annotate, render_report, AnnotatedPrediction, PredictionRecord};
pub use inference::{run_predict, run_train};
