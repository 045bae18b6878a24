use core_types::CollaboratorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Failed to read benchmark file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid provider configuration: {0}")]
    Configuration(String),
}

impl From<ApiError> for CollaboratorError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Api { status: 404, .. } => CollaboratorError::NotFound(err.to_string()),
            ApiError::Deserialization(_) | ApiError::InvalidData(_) => {
                CollaboratorError::InvalidData(err.to_string())
            }
            _ => CollaboratorError::Unavailable(err.to_string()),
        }
    }
}
