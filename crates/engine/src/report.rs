use benchmark::{PeerGroup, PortfolioComparison};
use chrono::{DateTime, Utc};
use core_types::{ClientProfile, Insight};
use forecast::{ForecastResult, ScenarioBands};
use risk::RiskScore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-request overrides of the orchestrator settings. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Metrics to forecast and benchmark; the configured list when empty.
    pub metrics: Vec<String>,
    pub horizon: Option<usize>,
    pub lookback_months: Option<u32>,
    /// End of the history window; now when absent.
    pub as_of: Option<DateTime<Utc>>,
    /// Skip writing insights to the sink.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub client_id: Uuid,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl AnalysisRequest {
    pub fn new(client_id: Uuid) -> Self {
        Self {
            client_id,
            options: AnalysisOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }
}

/// Where in the per-metric pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Preprocess,
    Forecast,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureStage::Fetch => "fetch",
            FailureStage::Preprocess => "preprocess",
            FailureStage::Forecast => "forecast",
        })
    }
}

/// Annotation for a metric that produced no forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFailure {
    pub metric: String,
    pub stage: FailureStage,
    pub reason: String,
}

impl MetricFailure {
    pub fn new(metric: impl Into<String>, stage: FailureStage, reason: impl ToString) -> Self {
        Self {
            metric: metric.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Forecast output of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAnalysis {
    pub metric: String,
    pub forecast: ForecastResult,
    pub scenarios: ScenarioBands,
    /// Last cleaned historical value, the reference for projected change.
    pub last_observed: f64,
    pub gap_filled: usize,
    pub outliers_corrected: usize,
}

impl MetricAnalysis {
    /// Relative change from the last observation to the end of the horizon.
    pub fn projected_change(&self) -> Option<f64> {
        let end = *self.forecast.values().last()?;
        (self.last_observed.abs() > f64::EPSILON)
            .then(|| (end - self.last_observed) / self.last_observed.abs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerBenchmark {
    pub peer_group: PeerGroup,
    pub comparison: PortfolioComparison,
}

/// Everything one client analysis produced, including what it could not produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAnalysis {
    pub client: ClientProfile,
    pub metrics: Vec<MetricAnalysis>,
    pub risk: Option<RiskScore>,
    pub industry_benchmark: Option<PortfolioComparison>,
    pub peer_benchmark: Option<PeerBenchmark>,
    pub failures: Vec<MetricFailure>,
    pub insights: Vec<Insight>,
    pub summary: Option<String>,
    /// Stage-level notes (skipped benchmarks, unpersisted insights, ...).
    pub notes: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl ClientAnalysis {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricAnalysis> {
        self.metrics.iter().find(|m| m.metric == name)
    }
}

/// A client of an organization run that could not be analysed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFailure {
    pub client_id: Uuid,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAnalysis {
    pub organization_id: Uuid,
    pub analyses: Vec<ClientAnalysis>,
    pub failures: Vec<ClientFailure>,
}

impl OrganizationAnalysis {
    pub fn client_count(&self) -> usize {
        self.analyses.len() + self.failures.len()
    }
}
