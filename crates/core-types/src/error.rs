use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

/// The error surface shared by every collaborator adapter (database, HTTP providers).
///
/// Adapters convert their own error types into this one so that the orchestrator can
/// apply a single retry / partial-failure policy.
#[derive(Error, Debug, Clone)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator call timed out after {0} ms")]
    Timeout(u64),

    #[error("The requested record was not found: {0}")]
    NotFound(String),

    #[error("Collaborator returned invalid data: {0}")]
    InvalidData(String),
}

impl From<CoreError> for CollaboratorError {
    fn from(err: CoreError) -> Self {
        CollaboratorError::InvalidData(err.to_string())
    }
}
