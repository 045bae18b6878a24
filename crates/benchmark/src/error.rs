use crate::peer_group::RelaxationStep;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BenchmarkError {
    #[error("Invalid benchmark distribution: {0}")]
    InvalidBenchmark(#[from] CoreError),

    #[error("Benchmark is for metric '{found}', expected '{expected}'")]
    MetricMismatch { expected: String, found: String },

    #[error("Client value for '{metric}' is not a finite number: {value}")]
    InvalidValue { metric: String, value: f64 },

    #[error("Not enough peer values for '{metric}': need {required}, got {actual}")]
    InsufficientPeers {
        metric: String,
        required: usize,
        actual: usize,
    },

    #[error("Peer group too small: found {found}, required {required} after {} relaxation steps", relaxation_path.len())]
    PeerGroupTooSmall {
        found: usize,
        required: usize,
        relaxation_path: Vec<RelaxationStep>,
    },

    #[error("None of the client's metrics has a benchmark distribution")]
    NoComparableMetrics,

    #[error("Invalid benchmark parameters: {0}")]
    InvalidParameters(String),
}
