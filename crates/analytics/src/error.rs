use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Insufficient data for {context}: need at least {required} observed points, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("Invalid analytics parameters: {0}")]
    InvalidParameters(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}
