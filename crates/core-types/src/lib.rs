//! # Meridian Core Types
//!
//! The shared vocabulary of the analytics workspace: metric series, client profiles,
//! benchmark distributions, the `Insight` record handed to dashboards, and the
//! collaborator traits behind which storage and third-party providers live.
//!
//! This is a Layer 0 crate. It contains no analytics logic and depends on no other
//! workspace crate.

pub mod benchmark;
pub mod client;
pub mod collaborators;
pub mod enums;
pub mod error;
pub mod insight;
pub mod metrics;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use benchmark::IndustryBenchmark;
pub use client::ClientProfile;
pub use collaborators::{BenchmarkProvider, FinancialHistorySource, InsightSink, Summarizer};
pub use enums::{CriterionKind, ModelId, Polarity};
pub use error::{CollaboratorError, CoreError};
pub use insight::{Impact, Insight, InsightMetadata, InsightType};
pub use series::{DataPoint, MetricSeries, PointFlag, TimeRange};
