use analytics::AnalyticsError;
use core_types::ModelId;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ForecastError {
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Insufficient data for {model}: need at least {required} points, got {actual}")]
    InsufficientData {
        model: ModelId,
        required: usize,
        actual: usize,
    },

    #[error("Model {model} failed to fit: {reason}")]
    FitFailed { model: ModelId, reason: String },

    #[error("All forecasting strategies failed (attempted {attempted:?}); last error: {last_cause}")]
    ModelFit {
        attempted: Vec<ModelId>,
        last_cause: String,
    },

    #[error("Invalid forecast parameters: {0}")]
    InvalidParameters(String),
}
