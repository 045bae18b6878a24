//! # Meridian Provider Clients
//!
//! Production implementations of the third-party collaborator traits.
//!
//! ## Public API
//!
//! - `BenchmarkApiClient`: the industry benchmark service, a `BenchmarkProvider`.
//! - `FileBenchmarkProvider`: benchmark distributions from a local JSON file.
//! - `NarrativeClient`: the narrative service, a `Summarizer`.
//!
//! Every client maps its failures into `CollaboratorError` so the orchestrator can
//! apply one retry and partial-failure policy regardless of the provider.

mod http;

pub mod benchmark_api;
pub mod error;
pub mod file_provider;
pub mod narrative;
pub mod responses;

pub use benchmark_api::BenchmarkApiClient;
pub use error::ApiError;
pub use file_provider::FileBenchmarkProvider;
pub use narrative::NarrativeClient;
