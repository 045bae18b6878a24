use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Analysis error: {0}")]
    Engine(#[from] EngineError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Engine(err) => {
                let status = match &err {
                    EngineError::ClientNotFound(_) | EngineError::NoClientsResolved(_) => StatusCode::NOT_FOUND,
                    EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    EngineError::ExternalFetch { .. } | EngineError::AllFetchesFailed { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Analysis failed.");
                }
                (status, err.to_string())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn engine_errors_map_to_statuses() {
        let status = |e: EngineError| AppError::from(e).into_response().status();
        assert_eq!(status(EngineError::ClientNotFound(Uuid::new_v4())), StatusCode::NOT_FOUND);
        assert_eq!(status(EngineError::InvalidRequest("x".to_string())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(EngineError::AllFetchesFailed { client_id: Uuid::new_v4(), failures: Vec::new() }),
            StatusCode::BAD_GATEWAY
        );
    }
}
