use crate::error::EngineError;
use crate::insights::{anomaly_insight, benchmark_insight, forecast_insight, peer_insight, risk_insights};
use crate::report::{
    AnalysisOptions, AnalysisRequest, ClientAnalysis, ClientFailure, FailureStage, MetricAnalysis,
    MetricFailure, OrganizationAnalysis, PeerBenchmark,
};
use crate::retry::CallPolicy;
use analytics::SeriesPreprocessor;
use benchmark::{peer_distribution, BenchmarkComparator, PeerGroupSelector, PortfolioComparison};
use chrono::Utc;
use configuration::{Config, OrchestratorSettings};
use core_types::{
    BenchmarkProvider, ClientProfile, CollaboratorError, FinancialHistorySource, Insight, InsightSink,
    MetricSeries, Summarizer, TimeRange,
};
use forecast::{ForecastBank, ScenarioGenerator};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use rayon::prelude::*;
use risk::{RiskScoringEngine, RiskSnapshot, INPUT_METRICS};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// The external systems the orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn FinancialHistorySource>,
    pub benchmarks: Arc<dyn BenchmarkProvider>,
    pub sink: Arc<dyn InsightSink>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

/// The CPU-bound per-metric chain: clean, forecast, build scenarios.
struct ForecastPipeline {
    preprocessor: SeriesPreprocessor,
    bank: ForecastBank,
    scenarios: ScenarioGenerator,
}

impl ForecastPipeline {
    fn run(&self, series: &MetricSeries, horizon: usize) -> Result<MetricAnalysis, MetricFailure> {
        let cleaned = self
            .preprocessor
            .clean(series)
            .map_err(|e| MetricFailure::new(&series.metric, FailureStage::Preprocess, e))?;
        let forecast = self
            .bank
            .forecast(&cleaned, horizon)
            .map_err(|e| MetricFailure::new(&series.metric, FailureStage::Forecast, e))?;
        let scenarios = self.scenarios.generate(&forecast, &cleaned);

        Ok(MetricAnalysis {
            metric: series.metric.clone(),
            last_observed: cleaned.last_value().unwrap_or_default(),
            gap_filled: cleaned.gap_filled.len(),
            outliers_corrected: cleaned.outliers.len(),
            forecast,
            scenarios,
        })
    }

    /// Metrics are independent; results keep the input order.
    fn run_all(&self, series: &[MetricSeries], horizon: usize) -> Vec<Result<MetricAnalysis, MetricFailure>> {
        series.par_iter().map(|s| self.run(s, horizon)).collect()
    }
}

#[derive(Default)]
struct BenchmarkOutcome {
    industry: Option<PortfolioComparison>,
    peer: Option<PeerBenchmark>,
    notes: Vec<String>,
}

/// Sequences fetching, forecasting, risk scoring and benchmarking for clients and
/// hands the normalised insights to the sink.
pub struct AnalyticsOrchestrator {
    collaborators: Collaborators,
    pipeline: Arc<ForecastPipeline>,
    risk: RiskScoringEngine,
    comparator: BenchmarkComparator,
    peers: PeerGroupSelector,
    settings: OrchestratorSettings,
    default_horizon: usize,
    policy: CallPolicy,
}

impl AnalyticsOrchestrator {
    /// Builds every component from `config`. Fails on settings a component rejects.
    pub fn new(config: &Config, collaborators: Collaborators) -> Result<Self, EngineError> {
        let pipeline = ForecastPipeline {
            preprocessor: SeriesPreprocessor::new(&config.preprocessing)?,
            bank: ForecastBank::from_settings(&config.forecast, &config.decomposition)?,
            scenarios: ScenarioGenerator::new(&config.scenario)?,
        };
        Ok(Self {
            collaborators,
            pipeline: Arc::new(pipeline),
            risk: RiskScoringEngine::new(),
            comparator: BenchmarkComparator::new(&config.benchmark),
            peers: PeerGroupSelector::new(&config.peer_group)?,
            settings: config.orchestrator.clone(),
            default_horizon: config.forecast.horizon,
            policy: CallPolicy::from_settings(&config.orchestrator),
        })
    }

    /// Runs the full analysis of one client.
    ///
    /// Per-metric problems are reported in `ClientAnalysis::failures`. The call only
    /// fails when the client cannot be resolved or no metric could be fetched.
    pub async fn analyze_client(&self, request: &AnalysisRequest) -> Result<ClientAnalysis, EngineError> {
        let client_id = request.client_id;
        let history = self.collaborators.history.as_ref();
        let profile = match self
            .policy
            .run("client profile", move || history.fetch_client(client_id))
            .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) | Err(CollaboratorError::NotFound(_)) => return Err(EngineError::ClientNotFound(client_id)),
            Err(source) => {
                return Err(EngineError::ExternalFetch {
                    operation: format!("client {client_id}"),
                    source,
                });
            }
        };
        self.analyze_profile(profile, &request.options, None).await
    }

    pub async fn analyze_organization(
        &self,
        organization_id: Uuid,
        options: &AnalysisOptions,
    ) -> Result<OrganizationAnalysis, EngineError> {
        self.analyze_organization_with(organization_id, options, |_, _| {}).await
    }

    /// Analyses every client of an organization, at most `max_concurrent_clients` at a
    /// time. `on_client` is called as each client finishes, with its success flag.
    ///
    /// Failing clients are collected rather than aborting the run; only an empty
    /// client population is an error.
    pub async fn analyze_organization_with<F>(
        &self,
        organization_id: Uuid,
        options: &AnalysisOptions,
        on_client: F,
    ) -> Result<OrganizationAnalysis, EngineError>
    where
        F: Fn(&ClientProfile, bool) + Sync,
    {
        let history = self.collaborators.history.as_ref();
        let clients = self
            .policy
            .run("organization clients", move || history.fetch_clients(organization_id))
            .await
            .map_err(|source| EngineError::ExternalFetch {
                operation: format!("clients of organization {organization_id}"),
                source,
            })?;
        if clients.is_empty() {
            return Err(EngineError::NoClientsResolved(organization_id));
        }
        tracing::info!(%organization_id, clients = clients.len(), "Starting organization analysis");

        let population = clients.as_slice();
        let on_client = &on_client;
        let outcomes: Vec<(ClientProfile, Result<ClientAnalysis, EngineError>)> = stream::iter(clients.iter().cloned())
            .map(|profile| async move {
                let result = self.analyze_profile(profile.clone(), options, Some(population)).await;
                on_client(&profile, result.is_ok());
                (profile, result)
            })
            .buffer_unordered(self.settings.max_concurrent_clients.max(1))
            .collect()
            .await;

        let mut analyses = Vec::new();
        let mut failures = Vec::new();
        for (profile, result) in outcomes {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => {
                    tracing::error!(client_id = %profile.client_id, error = %e, "Client analysis failed");
                    failures.push(ClientFailure {
                        client_id: profile.client_id,
                        name: profile.name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        analyses.sort_by(|a, b| a.client.name.cmp(&b.client.name));
        failures.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::info!(
            %organization_id,
            analysed = analyses.len(),
            failed = failures.len(),
            "Organization analysis complete"
        );
        Ok(OrganizationAnalysis {
            organization_id,
            analyses,
            failures,
        })
    }

    fn resolve_metrics(&self, options: &AnalysisOptions) -> Result<Vec<String>, EngineError> {
        let requested = if options.metrics.is_empty() {
            &self.settings.metrics
        } else {
            &options.metrics
        };
        let mut metrics: Vec<String> = Vec::with_capacity(requested.len());
        for metric in requested {
            let metric = metric.trim();
            if !metric.is_empty() && !metrics.iter().any(|m| m == metric) {
                metrics.push(metric.to_string());
            }
        }
        if metrics.is_empty() {
            return Err(EngineError::InvalidRequest("no metrics to analyse".to_string()));
        }
        Ok(metrics)
    }

    async fn analyze_profile(
        &self,
        profile: ClientProfile,
        options: &AnalysisOptions,
        population: Option<&[ClientProfile]>,
    ) -> Result<ClientAnalysis, EngineError> {
        let metrics = self.resolve_metrics(options)?;
        let horizon = options.horizon.unwrap_or(self.default_horizon);
        if horizon == 0 {
            return Err(EngineError::InvalidRequest("horizon must be at least 1".to_string()));
        }
        let lookback = options.lookback_months.unwrap_or(self.settings.lookback_months);
        let range = TimeRange::trailing_months(options.as_of.unwrap_or_else(Utc::now), lookback);
        let client_id = profile.client_id;
        tracing::info!(%client_id, client = %profile.name, metrics = metrics.len(), horizon, "Starting client analysis");

        // --- Fetch ---
        let risk_inputs: Vec<String> = INPUT_METRICS
            .iter()
            .filter(|m| !metrics.iter().any(|r| r == *m))
            .map(|m| m.to_string())
            .collect();
        let (fetched, auxiliary, prior_scores) = tokio::join!(
            join_all(metrics.iter().map(|m| self.fetch_metric(client_id, m, range))),
            self.fetch_risk_inputs(client_id, &risk_inputs, range),
            self.fetch_risk_history(client_id),
        );

        let mut notes = Vec::new();
        let mut failures = Vec::new();
        let mut series = Vec::with_capacity(fetched.len());
        for outcome in fetched {
            match outcome {
                Ok(s) => series.push(s),
                Err(failure) => {
                    tracing::warn!(%client_id, metric = %failure.metric, reason = %failure.reason, "Metric fetch failed");
                    failures.push(failure);
                }
            }
        }
        if series.is_empty() {
            tracing::error!(%client_id, "No metric could be fetched");
            return Err(EngineError::AllFetchesFailed { client_id, failures });
        }
        let auxiliary = auxiliary.unwrap_or_else(|e| {
            notes.push(format!("supplementary risk inputs unavailable: {e}"));
            Vec::new()
        });
        let prior_scores = prior_scores.unwrap_or_else(|e| {
            notes.push(format!("risk history unavailable, trends not computed: {e}"));
            Vec::new()
        });

        // --- Compute: forecasting, risk and benchmarking run side by side ---
        let mut scoring_series = series.clone();
        scoring_series.extend(auxiliary);

        let pipeline = Arc::clone(&self.pipeline);
        let forecasting = tokio::task::spawn_blocking(move || pipeline.run_all(&series, horizon));
        let scorer = self.risk.clone();
        let snapshot = RiskSnapshot::from_series(client_id, &scoring_series);
        let scoring = tokio::task::spawn_blocking(move || scorer.score(&snapshot, &prior_scores));
        let benchmarking = self.benchmark_client(&profile, &scoring_series, range, population);
        let (forecasted, risk, benchmarks) = tokio::join!(forecasting, scoring, benchmarking);

        let mut analyses = Vec::new();
        for outcome in forecasted? {
            match outcome {
                Ok(analysis) => analyses.push(analysis),
                Err(failure) => {
                    tracing::warn!(%client_id, metric = %failure.metric, stage = %failure.stage, reason = %failure.reason, "Metric analysis failed");
                    failures.push(failure);
                }
            }
        }
        let risk = match risk? {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::warn!(%client_id, error = %e, "Risk scoring skipped");
                notes.push(format!("risk scoring skipped: {e}"));
                None
            }
        };
        notes.extend(benchmarks.notes);

        // --- Hand-off ---
        let mut insights = Vec::new();
        for analysis in &analyses {
            insights.push(forecast_insight(client_id, analysis));
            insights.extend(anomaly_insight(client_id, analysis));
        }
        if let Some(score) = &risk {
            insights.extend(risk_insights(score));
        }
        if let Some(comparison) = &benchmarks.industry {
            insights.push(benchmark_insight(client_id, comparison, "industry_benchmark"));
        }
        if let Some(peer) = &benchmarks.peer {
            insights.push(peer_insight(client_id, peer));
        }

        if !options.dry_run {
            let unsaved = self.persist(&insights).await;
            if unsaved > 0 {
                notes.push(format!("{unsaved} of {} insights were not persisted", insights.len()));
            }
        }
        let summary = self.summarize(client_id, &insights, &mut notes).await;

        tracing::info!(
            %client_id,
            forecasts = analyses.len(),
            failures = failures.len(),
            insights = insights.len(),
            "Client analysis complete"
        );
        Ok(ClientAnalysis {
            client: profile,
            metrics: analyses,
            risk,
            industry_benchmark: benchmarks.industry,
            peer_benchmark: benchmarks.peer,
            failures,
            insights,
            summary,
            notes,
            analyzed_at: Utc::now(),
        })
    }

    async fn fetch_metric(&self, client_id: Uuid, metric: &str, range: TimeRange) -> Result<MetricSeries, MetricFailure> {
        let history = self.collaborators.history.as_ref();
        let names = [metric.to_string()];
        let names: &[String] = &names;
        let fetched = self
            .policy
            .run(&format!("{metric} history"), move || {
                history.fetch_financial_history(client_id, names, range)
            })
            .await
            .map_err(|e| MetricFailure::new(metric, FailureStage::Fetch, e))?;
        fetched
            .into_iter()
            .find(|s| s.metric == metric && s.observed_count() > 0)
            .ok_or_else(|| MetricFailure::new(metric, FailureStage::Fetch, "no observations in the requested window"))
    }

    async fn fetch_risk_inputs(
        &self,
        client_id: Uuid,
        metrics: &[String],
        range: TimeRange,
    ) -> Result<Vec<MetricSeries>, CollaboratorError> {
        if metrics.is_empty() {
            return Ok(Vec::new());
        }
        let history = self.collaborators.history.as_ref();
        self.policy
            .run("risk inputs", move || history.fetch_financial_history(client_id, metrics, range))
            .await
    }

    async fn fetch_risk_history(&self, client_id: Uuid) -> Result<Vec<f64>, CollaboratorError> {
        let history = self.collaborators.history.as_ref();
        let limit = self.settings.risk_history_limit;
        self.policy
            .run("risk history", move || history.fetch_risk_history(client_id, limit))
            .await
    }

    async fn benchmark_client(
        &self,
        profile: &ClientProfile,
        series: &[MetricSeries],
        range: TimeRange,
        population: Option<&[ClientProfile]>,
    ) -> BenchmarkOutcome {
        let client_values: HashMap<String, f64> = series
            .iter()
            .filter_map(|s| s.latest_value().map(|v| (s.metric.clone(), v)))
            .collect();
        if client_values.is_empty() {
            return BenchmarkOutcome {
                notes: vec!["benchmarking skipped: no current metric values".to_string()],
                ..BenchmarkOutcome::default()
            };
        }
        let mut metric_names: Vec<String> = client_values.keys().cloned().collect();
        metric_names.sort();

        let (industry, peer) = tokio::join!(
            self.industry_benchmark(profile, &client_values, &metric_names),
            self.peer_benchmark(profile, &client_values, &metric_names, range, population),
        );

        let mut outcome = BenchmarkOutcome::default();
        match industry {
            Ok(comparison) => outcome.industry = Some(comparison),
            Err(e) => {
                tracing::warn!(client_id = %profile.client_id, error = %e, "Industry benchmark skipped");
                outcome.notes.push(format!("industry benchmark skipped: {e}"));
            }
        }
        match peer {
            Ok(peer) => outcome.peer = peer,
            Err(e) => {
                tracing::warn!(client_id = %profile.client_id, error = %e, "Peer benchmark skipped");
                outcome.notes.push(format!("peer benchmark skipped: {e}"));
            }
        }
        outcome
    }

    async fn industry_benchmark(
        &self,
        profile: &ClientProfile,
        client_values: &HashMap<String, f64>,
        metric_names: &[String],
    ) -> Result<PortfolioComparison, EngineError> {
        let provider = self.collaborators.benchmarks.as_ref();
        let industry = profile.industry_code.as_str();
        let distributions = self
            .policy
            .run("industry benchmarks", move || {
                provider.fetch_industry_distribution(industry, metric_names)
            })
            .await
            .map_err(|source| EngineError::ExternalFetch {
                operation: format!("benchmarks for industry {industry}"),
                source,
            })?;
        Ok(self.comparator.compare_portfolio(client_values, &distributions)?)
    }

    /// Benchmarks against the latest values of a matched peer cohort.
    async fn peer_benchmark(
        &self,
        profile: &ClientProfile,
        client_values: &HashMap<String, f64>,
        metric_names: &[String],
        range: TimeRange,
        population: Option<&[ClientProfile]>,
    ) -> Result<Option<PeerBenchmark>, EngineError> {
        if !self.settings.peer_benchmarks {
            return Ok(None);
        }
        let fetched_population;
        let candidates = match population {
            Some(candidates) => candidates,
            None => {
                let history = self.collaborators.history.as_ref();
                let organization_id = profile.organization_id;
                fetched_population = self
                    .policy
                    .run("peer candidates", move || history.fetch_clients(organization_id))
                    .await
                    .map_err(|source| EngineError::ExternalFetch {
                        operation: format!("clients of organization {organization_id}"),
                        source,
                    })?;
                fetched_population.as_slice()
            }
        };
        let peer_group = self.peers.select(profile, candidates)?;

        let peer_fetches = peer_group
            .members
            .iter()
            .map(|member| self.fetch_peer_history(member.profile.client_id, metric_names, range));
        let mut peer_values: HashMap<String, Vec<f64>> = HashMap::new();
        for (peer_id, result) in join_all(peer_fetches).await {
            match result {
                Ok(series) => {
                    for s in series {
                        if let Some(value) = s.latest_value() {
                            peer_values.entry(s.metric).or_default().push(value);
                        }
                    }
                }
                Err(e) => tracing::warn!(%peer_id, error = %e, "Skipping peer without history"),
            }
        }

        let peer_code = format!("peer:{}", profile.client_id);
        let distributions: Vec<_> = metric_names
            .iter()
            .filter_map(|metric| {
                let values = peer_values.get(metric)?;
                match peer_distribution(metric, values, &peer_code) {
                    Ok(distribution) => Some(distribution),
                    Err(e) => {
                        tracing::debug!(metric = %metric, error = %e, "No peer distribution");
                        None
                    }
                }
            })
            .collect();
        let comparison = self.comparator.compare_portfolio(client_values, &distributions)?;
        Ok(Some(PeerBenchmark { peer_group, comparison }))
    }

    /// Appends every insight; returns how many could not be written.
    async fn persist(&self, insights: &[Insight]) -> usize {
        let writes = insights.iter().map(|insight| self.persist_one(insight));
        join_all(writes).await.into_iter().filter(|saved| !saved).count()
    }

    async fn persist_one(&self, insight: &Insight) -> bool {
        let sink = self.collaborators.sink.as_ref();
        match self
            .policy
            .run("persist insight", move || sink.persist_insight(insight))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(insight_id = %insight.id, error = %e, "Failed to persist insight");
                false
            }
        }
    }

    async fn fetch_peer_history(
        &self,
        peer_id: Uuid,
        metric_names: &[String],
        range: TimeRange,
    ) -> (Uuid, Result<Vec<MetricSeries>, CollaboratorError>) {
        let history = self.collaborators.history.as_ref();
        let result = self
            .policy
            .run("peer history", move || history.fetch_financial_history(peer_id, metric_names, range))
            .await;
        (peer_id, result)
    }

    async fn summarize(&self, client_id: Uuid, insights: &[Insight], notes: &mut Vec<String>) -> Option<String> {
        if !self.settings.summarize || insights.is_empty() {
            return None;
        }
        let Some(summarizer) = self.collaborators.summarizer.as_deref() else {
            notes.push("summary requested but no summarizer is configured".to_string());
            return None;
        };
        match self
            .policy
            .run("narrative summary", move || summarizer.summarize(insights))
            .await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!(%client_id, error = %e, "Narrative summary unavailable");
                notes.push(format!("summary unavailable: {e}"));
                None
            }
        }
    }
}
