use crate::report::MetricFailure;
use core_types::CollaboratorError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to fetch {operation} after retry: {source}")]
    ExternalFetch {
        operation: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("Client {0} was not found")]
    ClientNotFound(Uuid),

    #[error("No clients resolved for organization {0}")]
    NoClientsResolved(Uuid),

    #[error("Every metric fetch failed for client {client_id} ({} failures)", failures.len())]
    AllFetchesFailed {
        client_id: Uuid,
        failures: Vec<MetricFailure>,
    },

    #[error("Invalid analysis request: {0}")]
    InvalidRequest(String),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] forecast::ForecastError),

    #[error("Benchmark error: {0}")]
    Benchmark(#[from] benchmark::BenchmarkError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
