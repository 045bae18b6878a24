//! # Meridian Analytics Engine
//!
//! The orchestration layer. It resolves clients, fetches their history through the
//! collaborator traits, runs the analytics components and hands the normalised
//! `Insight` records to the sink.
//!
//! ## Architectural Principles
//!
//! - **Explicit Context:** Collaborators arrive as `Arc<dyn Trait>` in `Collaborators`,
//!   settings through `Config`. There is no global state.
//! - **Partial Results:** Every collaborator call gets a timeout and one retry. A metric
//!   that still fails is annotated in `ClientAnalysis::failures` while its siblings
//!   carry on. Only an unresolvable client or a total fetch failure is fatal.
//! - **Concurrency:** Metric fetches fan out with `join_all`; forecasting runs on rayon
//!   inside the blocking pool while risk scoring and benchmarking proceed alongside.
//!
//! ## Public API
//!
//! - `AnalyticsOrchestrator::analyze_client` / `analyze_organization`: the entry points.
//! - `AnalysisRequest`, `AnalysisOptions`: what to analyse.
//! - `ClientAnalysis`, `OrganizationAnalysis`, `MetricFailure`: what came out.
//! - `insights`: the mapping from component outputs to `Insight` records.

pub mod error;
pub mod insights;
pub mod orchestrator;
pub mod report;
pub mod retry;

pub use error::EngineError;
pub use orchestrator::{AnalyticsOrchestrator, Collaborators};
pub use report::{
    AnalysisOptions, AnalysisRequest, ClientAnalysis, ClientFailure, FailureStage, MetricAnalysis,
    MetricFailure, OrganizationAnalysis, PeerBenchmark,
};
pub use retry::CallPolicy;
