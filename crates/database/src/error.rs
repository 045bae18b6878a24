use core_types::CollaboratorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Stored data is invalid: {0}")]
    InvalidData(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl From<DbError> for CollaboratorError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => CollaboratorError::NotFound(err.to_string()),
            DbError::JsonError(_) | DbError::InvalidData(_) => {
                CollaboratorError::InvalidData(err.to_string())
            }
            DbError::QueryError(sqlx::Error::RowNotFound) => {
                CollaboratorError::NotFound(err.to_string())
            }
            DbError::ConnectionConfigError(_)
            | DbError::QueryError(_)
            | DbError::MigrationError(_) => CollaboratorError::Unavailable(err.to_string()),
        }
    }
}
