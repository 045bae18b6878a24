use crate::error::ConfigError;
use core_types::{CriterionKind, ModelId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
///
/// Every section has defaults, so an empty `config.toml` yields a working setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preprocessing: PreprocessingSettings,
    pub decomposition: DecompositionSettings,
    pub forecast: ForecastSettings,
    pub scenario: ScenarioSettings,
    pub benchmark: BenchmarkSettings,
    pub peer_group: PeerGroupSettings,
    pub orchestrator: OrchestratorSettings,
    pub providers: ProviderSettings,
    pub logging: LoggingSettings,
    pub server: ServerSettings,
}

/// Parameters for cleaning raw series before any modelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessingSettings {
    /// Width of the centred moving average. Must be odd.
    pub smoothing_window: usize,
    /// Outlier threshold as a multiple of the interquartile range.
    pub iqr_multiplier: f64,
    /// Minimum number of observed points required to process a series.
    pub min_points: usize,
}

/// Parameters for the additive trend/seasonal decomposition.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecompositionSettings {
    /// Length of one seasonal cycle in periods (12 for monthly data).
    pub period: usize,
    /// Fraction of the series used by each LOESS local fit.
    pub loess_span: f64,
    /// Seasonal-to-irregular variance ratio above which forecasts are seasonally adjusted.
    pub seasonal_strength_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// The strategy the orchestrator runs for every metric.
    pub model: ModelId,
    /// Constituents used when `model` is `ensemble`.
    pub ensemble_members: Vec<ModelId>,
    /// Number of future periods to project.
    pub horizon: usize,
    /// Nominal confidence level in `(0, 1)`.
    pub confidence_level: f64,
    /// Multiplier applied to ensemble confidence when a constituent fails.
    pub degraded_penalty: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Band half-width in units of historical volatility.
    pub volatility_multiplier: f64,
    /// Upper bound on the volatility estimate.
    pub max_volatility: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Overrides for the per-metric weights of the portfolio score.
    pub metric_weights: HashMap<String, f64>,
    /// Weight of metrics missing from the lookup table.
    pub default_weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriterionSettings {
    pub kind: CriterionKind,
    pub weight: f64,
    /// Relative tolerance band, only meaningful for `revenue_size` (0.5 = ±50%).
    #[serde(default)]
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerGroupSettings {
    pub min_size: usize,
    /// Factor by which a tolerance band widens on each relaxation step.
    pub tolerance_growth: f64,
    /// Tolerance beyond which a band is no longer widened.
    pub max_tolerance: f64,
    /// Ordered matching criteria.
    pub criteria: Vec<CriterionSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Metrics analysed when a request does not name any.
    pub metrics: Vec<String>,
    /// History window fetched for each analysis.
    pub lookback_months: u32,
    /// Timeout applied to each collaborator call.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Delay before the single retry of a failed fetch.
    #[serde(with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Upper bound on clients analysed concurrently in an organization run.
    pub max_concurrent_clients: usize,
    /// Number of prior risk scores used for trend tags.
    pub risk_history_limit: usize,
    /// Whether to build a peer group and benchmark against it.
    pub peer_benchmarks: bool,
    /// Whether to request a narrative summary (needs `providers.narrative`).
    pub summarize: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpProviderSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Remote benchmark API. Takes precedence over `benchmark_file`.
    pub benchmark_api: Option<HttpProviderSettings>,
    /// JSON file with benchmark distributions, for offline use.
    pub benchmark_file: Option<PathBuf>,
    /// Narrative summarizer service.
    pub narrative: Option<HttpProviderSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

// --- Default Implementations ---

impl Default for PreprocessingSettings {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            iqr_multiplier: 1.5,
            min_points: 4,
        }
    }
}

impl Default for DecompositionSettings {
    fn default() -> Self {
        Self {
            period: 12,
            loess_span: 0.5,
            seasonal_strength_threshold: 1.0,
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            model: ModelId::Ensemble,
            ensemble_members: vec![ModelId::TrendExtrapolation, ModelId::ExponentialSmoothing],
            horizon: 6,
            confidence_level: 0.95,
            degraded_penalty: 0.8,
        }
    }
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            volatility_multiplier: 1.5,
            max_volatility: 1.0,
        }
    }
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            metric_weights: HashMap::new(),
            default_weight: 0.1,
        }
    }
}

impl Default for PeerGroupSettings {
    fn default() -> Self {
        Self {
            min_size: 10,
            tolerance_growth: 2.0,
            max_tolerance: 4.0,
            criteria: vec![
                CriterionSettings { kind: CriterionKind::Industry, weight: 0.4, tolerance: None },
                CriterionSettings { kind: CriterionKind::RevenueSize, weight: 0.3, tolerance: Some(0.5) },
                CriterionSettings { kind: CriterionKind::Geography, weight: 0.2, tolerance: None },
                CriterionSettings { kind: CriterionKind::BusinessModel, weight: 0.1, tolerance: None },
            ],
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            metrics: ["revenue", "cash_flow", "current_ratio", "profit_margin", "debt_to_equity"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            lookback_months: 24,
            request_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(500),
            max_concurrent_clients: 4,
            risk_history_limit: 6,
            peer_benchmarks: true,
            summarize: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "meridian.log".to_string(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

// --- Validation ---

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

impl Config {
    /// Rejects settings the analytics components cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.preprocessing;
        if p.smoothing_window == 0 || p.smoothing_window % 2 == 0 {
            return Err(invalid("preprocessing.smoothing_window must be a positive odd number"));
        }
        if !(p.iqr_multiplier > 0.0) {
            return Err(invalid("preprocessing.iqr_multiplier must be positive"));
        }
        if p.min_points < 4 {
            return Err(invalid("preprocessing.min_points cannot be lower than 4"));
        }

        let d = &self.decomposition;
        if d.period < 2 {
            return Err(invalid("decomposition.period must be at least 2"));
        }
        if !(d.loess_span > 0.0 && d.loess_span <= 1.0) {
            return Err(invalid("decomposition.loess_span must be in (0, 1]"));
        }

        let f = &self.forecast;
        if f.horizon == 0 {
            return Err(invalid("forecast.horizon must be at least 1"));
        }
        if !(f.confidence_level > 0.0 && f.confidence_level < 1.0) {
            return Err(invalid("forecast.confidence_level must be in (0, 1)"));
        }
        if !(f.degraded_penalty > 0.0 && f.degraded_penalty <= 1.0) {
            return Err(invalid("forecast.degraded_penalty must be in (0, 1]"));
        }
        if f.model == ModelId::Ensemble {
            if f.ensemble_members.len() < 2 {
                return Err(invalid("forecast.ensemble_members needs at least two models"));
            }
            if f.ensemble_members.contains(&ModelId::Ensemble) {
                return Err(invalid("forecast.ensemble_members cannot contain 'ensemble'"));
            }
        }

        let s = &self.scenario;
        if !(s.volatility_multiplier >= 0.0) || !(s.max_volatility > 0.0) {
            return Err(invalid("scenario multipliers must be non-negative and max_volatility positive"));
        }

        let b = &self.benchmark;
        if b.default_weight < 0.0 || b.metric_weights.values().any(|w| !(*w >= 0.0)) {
            return Err(invalid("benchmark weights must be non-negative"));
        }

        let g = &self.peer_group;
        if g.min_size == 0 {
            return Err(invalid("peer_group.min_size must be at least 1"));
        }
        if !(g.tolerance_growth > 1.0) {
            return Err(invalid("peer_group.tolerance_growth must be greater than 1"));
        }
        if g.criteria.iter().any(|c| !(c.weight > 0.0) || c.tolerance.is_some_and(|t| !(t >= 0.0))) {
            return Err(invalid("peer_group.criteria weights must be positive and tolerances non-negative"));
        }

        let o = &self.orchestrator;
        if o.max_concurrent_clients == 0 {
            return Err(invalid("orchestrator.max_concurrent_clients must be at least 1"));
        }
        if o.request_timeout.is_zero() {
            return Err(invalid("orchestrator.request_timeout must be non-zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn empty_file_yields_valid_defaults() {
        let cfg = from_toml("");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.preprocessing.smoothing_window, 3);
        assert_eq!(cfg.forecast.model, ModelId::Ensemble);
        assert_eq!(cfg.peer_group.criteria.len(), 4);
    }

    #[test]
    fn parses_durations_and_overrides() {
        let cfg = from_toml(
            r#"
            [orchestrator]
            request_timeout = "2s"
            retry_backoff = "250ms"
            metrics = ["revenue"]

            [forecast]
            model = "exponential_smoothing"
            horizon = 3

            [benchmark.metric_weights]
            net_margin = 0.5
            "#,
        );
        assert_eq!(cfg.orchestrator.request_timeout, Duration::from_secs(2));
        assert_eq!(cfg.orchestrator.retry_backoff, Duration::from_millis(250));
        assert_eq!(cfg.orchestrator.metrics, vec!["revenue".to_string()]);
        assert_eq!(cfg.forecast.model, ModelId::ExponentialSmoothing);
        assert_eq!(cfg.benchmark.metric_weights.get("net_margin"), Some(&0.5));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_even_smoothing_window() {
        let mut cfg = Config::default();
        cfg.preprocessing.smoothing_window = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_single_member_ensemble() {
        let mut cfg = Config::default();
        cfg.forecast.ensemble_members = vec![ModelId::TrendExtrapolation];
        assert!(cfg.validate().is_err());
    }
}
