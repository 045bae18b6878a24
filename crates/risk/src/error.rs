use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Risk parameters are invalid: {0}")]
    InvalidParameters(String),

    #[error("Invalid risk input '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("A calculation error occurred: {0}")]
    Calculation(String),
}
