//! Interfaces of the systems the engine consumes but does not own.
//!
//! The orchestrator only ever sees these traits; the `database` and `api-client`
//! crates provide the production implementations.

use crate::benchmark::IndustryBenchmark;
use crate::client::ClientProfile;
use crate::error::CollaboratorError;
use crate::insight::Insight;
use crate::series::{MetricSeries, TimeRange};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence / accounting-feed source of historical client data.
#[async_trait]
pub trait FinancialHistorySource: Send + Sync {
    /// Returns one series per requested metric that has any data in `range`.
    async fn fetch_financial_history(
        &self,
        client_id: Uuid,
        metric_names: &[String],
        range: TimeRange,
    ) -> Result<Vec<MetricSeries>, CollaboratorError>;

    async fn fetch_client(&self, client_id: Uuid) -> Result<Option<ClientProfile>, CollaboratorError>;

    /// The current client population of an organization.
    async fn fetch_clients(&self, organization_id: Uuid) -> Result<Vec<ClientProfile>, CollaboratorError>;

    /// Previously computed overall risk scores, oldest first, at most `limit` of them.
    async fn fetch_risk_history(&self, client_id: Uuid, limit: usize) -> Result<Vec<f64>, CollaboratorError>;
}

/// External source of industry benchmark distributions.
#[async_trait]
pub trait BenchmarkProvider: Send + Sync {
    async fn fetch_industry_distribution(
        &self,
        industry_code: &str,
        metric_names: &[String],
    ) -> Result<Vec<IndustryBenchmark>, CollaboratorError>;
}

/// Append-only storage for insight records.
#[async_trait]
pub trait InsightSink: Send + Sync {
    async fn persist_insight(&self, record: &Insight) -> Result<(), CollaboratorError>;
}

/// Optional narrative generator turning insight records into prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, insight_records: &[Insight]) -> Result<String, CollaboratorError>;
}
