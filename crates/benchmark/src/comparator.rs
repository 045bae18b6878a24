use crate::error::BenchmarkError;
use analytics::stats;
use configuration::BenchmarkSettings;
use core_types::{metrics, IndustryBenchmark};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Portfolio weights for the metrics that matter most to competitive position.
const DEFAULT_METRIC_WEIGHTS: [(&str, f64); 6] = [
    (metrics::NET_MARGIN, 0.25),
    (metrics::PROFIT_MARGIN, 0.25),
    (metrics::REVENUE_GROWTH, 0.20),
    (metrics::CURRENT_RATIO, 0.15),
    (metrics::DEBT_TO_EQUITY, 0.15),
    (metrics::RETURN_ON_ASSETS, 0.15),
];

/// Fewest peer values from which a distribution is built.
pub const MIN_PEER_VALUES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Poor,
    BelowAverage,
    Average,
    Good,
    Excellent,
}

impl PerformanceTier {
    pub fn from_rank(rank: f64) -> Self {
        if rank >= 90.0 {
            PerformanceTier::Excellent
        } else if rank >= 75.0 {
            PerformanceTier::Good
        } else if rank >= 50.0 {
            PerformanceTier::Average
        } else if rank >= 25.0 {
            PerformanceTier::BelowAverage
        } else {
            PerformanceTier::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Average => "average",
            PerformanceTier::BelowAverage => "below_average",
            PerformanceTier::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitivePosition {
    Leader,
    AboveAverage,
    Average,
    BelowAverage,
    Laggard,
}

impl CompetitivePosition {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            CompetitivePosition::Leader
        } else if score >= 75.0 {
            CompetitivePosition::AboveAverage
        } else if score >= 50.0 {
            CompetitivePosition::Average
        } else if score >= 25.0 {
            CompetitivePosition::BelowAverage
        } else {
            CompetitivePosition::Laggard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitivePosition::Leader => "leader",
            CompetitivePosition::AboveAverage => "above_average",
            CompetitivePosition::Average => "average",
            CompetitivePosition::BelowAverage => "below_average",
            CompetitivePosition::Laggard => "laggard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub metric: String,
    pub client_value: f64,
    pub benchmark: IndustryBenchmark,
    /// One of 25, 50, 75, 90, 95.
    pub percentile_rank: u8,
    /// `client_value - p50`.
    pub variance_from_median: f64,
    /// Variance relative to `|p50|`; `None` when the median is zero.
    pub variance_pct: Option<f64>,
    pub tier: PerformanceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioComparison {
    pub comparisons: Vec<BenchmarkComparison>,
    /// Weighted mean of percentile ranks, in `[25, 95]`.
    pub overall_score: f64,
    pub position: CompetitivePosition,
    /// Metrics at `good` or better.
    pub strengths: Vec<String>,
    /// Metrics at `below_average` or worse.
    pub weaknesses: Vec<String>,
    /// Client metrics for which no distribution was available.
    pub unbenchmarked: Vec<String>,
}

/// Five-bucket rank of `value` within a distribution's anchors.
///
/// The rank is positional: a lower-is-better metric sitting above P90 still ranks 95.
/// Callers that care about polarity read it from the metric catalogue.
pub fn percentile_rank(value: f64, benchmark: &IndustryBenchmark) -> u8 {
    if value <= benchmark.p25 {
        25
    } else if value <= benchmark.p50 {
        50
    } else if value <= benchmark.p75 {
        75
    } else if value <= benchmark.p90 {
        90
    } else {
        95
    }
}

/// Builds a distribution for `metric` from peer values.
pub fn peer_distribution(
    metric: &str,
    values: &[f64],
    industry_code: &str,
) -> Result<IndustryBenchmark, BenchmarkError> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.len() < MIN_PEER_VALUES {
        return Err(BenchmarkError::InsufficientPeers {
            metric: metric.to_string(),
            required: MIN_PEER_VALUES,
            actual: finite.len(),
        });
    }
    let q = |p: f64| stats::quantile(&finite, p).unwrap_or_default();
    let benchmark = IndustryBenchmark {
        industry_code: industry_code.to_string(),
        metric: metric.to_string(),
        p25: q(0.25),
        p50: q(0.50),
        p75: q(0.75),
        p90: q(0.90),
        sample_size: finite.len() as u32,
    };
    benchmark.validate()?;
    Ok(benchmark)
}

#[derive(Debug, Clone)]
pub struct BenchmarkComparator {
    metric_weights: HashMap<String, f64>,
    default_weight: f64,
}

impl Default for BenchmarkComparator {
    fn default() -> Self {
        Self {
            metric_weights: DEFAULT_METRIC_WEIGHTS
                .iter()
                .map(|(m, w)| (m.to_string(), *w))
                .collect(),
            default_weight: 0.1,
        }
    }
}

impl BenchmarkComparator {
    /// The built-in weight table with configured overrides layered on top.
    pub fn new(settings: &BenchmarkSettings) -> Self {
        let mut comparator = Self::default();
        comparator
            .metric_weights
            .extend(settings.metric_weights.iter().map(|(m, w)| (m.clone(), *w)));
        comparator.default_weight = settings.default_weight;
        comparator
    }

    pub fn weight(&self, metric: &str) -> f64 {
        self.metric_weights
            .get(metric)
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn compare(
        &self,
        metric: &str,
        value: f64,
        benchmark: &IndustryBenchmark,
    ) -> Result<BenchmarkComparison, BenchmarkError> {
        if benchmark.metric != metric {
            return Err(BenchmarkError::MetricMismatch {
                expected: metric.to_string(),
                found: benchmark.metric.clone(),
            });
        }
        if !value.is_finite() {
            return Err(BenchmarkError::InvalidValue {
                metric: metric.to_string(),
                value,
            });
        }
        benchmark.validate()?;

        let percentile_rank = percentile_rank(value, benchmark);
        let variance_from_median = value - benchmark.p50;
        let variance_pct =
            (benchmark.p50.abs() > f64::EPSILON).then(|| variance_from_median / benchmark.p50.abs());

        Ok(BenchmarkComparison {
            metric: metric.to_string(),
            client_value: value,
            benchmark: benchmark.clone(),
            percentile_rank,
            variance_from_median,
            variance_pct,
            tier: PerformanceTier::from_rank(percentile_rank as f64),
        })
    }

    /// Compares every client metric that has a distribution and aggregates the ranks.
    ///
    /// Metrics whose comparison fails (e.g. an invalid distribution) are logged and
    /// reported as unbenchmarked rather than failing the whole portfolio.
    pub fn compare_portfolio(
        &self,
        client_values: &HashMap<String, f64>,
        benchmarks: &[IndustryBenchmark],
    ) -> Result<PortfolioComparison, BenchmarkError> {
        let mut metrics: Vec<&String> = client_values.keys().collect();
        metrics.sort();

        let mut comparisons = Vec::new();
        let mut unbenchmarked = Vec::new();
        for metric in metrics {
            let value = client_values[metric];
            match benchmarks.iter().find(|b| &b.metric == metric) {
                Some(benchmark) => match self.compare(metric, value, benchmark) {
                    Ok(c) => comparisons.push(c),
                    Err(e) => {
                        tracing::warn!(metric = %metric, error = %e, "Skipping benchmark comparison");
                        unbenchmarked.push(metric.clone());
                    }
                },
                None => unbenchmarked.push(metric.clone()),
            }
        }

        if comparisons.is_empty() {
            return Err(BenchmarkError::NoComparableMetrics);
        }

        let total_weight: f64 = comparisons.iter().map(|c| self.weight(&c.metric)).sum();
        let overall_score = if total_weight > 0.0 {
            comparisons
                .iter()
                .map(|c| c.percentile_rank as f64 * self.weight(&c.metric))
                .sum::<f64>()
                / total_weight
        } else {
            comparisons.iter().map(|c| c.percentile_rank as f64).sum::<f64>()
                / comparisons.len() as f64
        };

        let strengths = comparisons
            .iter()
            .filter(|c| c.tier >= PerformanceTier::Good)
            .map(|c| c.metric.clone())
            .collect();
        let weaknesses = comparisons
            .iter()
            .filter(|c| c.tier <= PerformanceTier::BelowAverage)
            .map(|c| c.metric.clone())
            .collect();

        Ok(PortfolioComparison {
            position: CompetitivePosition::from_score(overall_score),
            overall_score,
            comparisons,
            strengths,
            weaknesses,
            unbenchmarked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margin_benchmark() -> IndustryBenchmark {
        IndustryBenchmark {
            industry_code: "5412".to_string(),
            metric: "net_margin".to_string(),
            p25: 0.04,
            p50: 0.08,
            p75: 0.12,
            p90: 0.18,
            sample_size: 250,
        }
    }

    #[test]
    fn value_at_p75_ranks_75_and_is_good() {
        let comparison = BenchmarkComparator::default()
            .compare("net_margin", 0.12, &margin_benchmark())
            .unwrap();
        assert_eq!(comparison.percentile_rank, 75);
        assert_eq!(comparison.tier, PerformanceTier::Good);
        assert!((comparison.variance_from_median - 0.04).abs() < 1e-12);
    }

    #[test]
    fn rank_is_monotonic_in_value() {
        let b = margin_benchmark();
        let values = [-0.1, 0.04, 0.05, 0.08, 0.1, 0.12, 0.15, 0.18, 0.3];
        let ranks: Vec<u8> = values.iter().map(|v| percentile_rank(*v, &b)).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ranks.first(), Some(&25));
        assert_eq!(ranks.last(), Some(&95));
    }

    #[test]
    fn mismatched_metric_is_rejected() {
        let err = BenchmarkComparator::default()
            .compare("current_ratio", 1.0, &margin_benchmark())
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::MetricMismatch { .. }));
    }

    #[test]
    fn portfolio_score_is_weighted() {
        let mut ratio = margin_benchmark();
        ratio.metric = "current_ratio".to_string();
        ratio.p25 = 1.0;
        ratio.p50 = 1.5;
        ratio.p75 = 2.0;
        ratio.p90 = 2.5;

        let values = HashMap::from([
            ("net_margin".to_string(), 0.20),
            ("current_ratio".to_string(), 0.8),
            ("headcount".to_string(), 12.0),
        ]);
        let portfolio = BenchmarkComparator::default()
            .compare_portfolio(&values, &[margin_benchmark(), ratio])
            .unwrap();

        let expected = (95.0 * 0.25 + 25.0 * 0.15) / 0.40;
        assert!((portfolio.overall_score - expected).abs() < 1e-9);
        assert_eq!(portfolio.position, CompetitivePosition::Average);
        assert_eq!(portfolio.strengths, vec!["net_margin".to_string()]);
        assert_eq!(portfolio.weaknesses, vec!["current_ratio".to_string()]);
        assert_eq!(portfolio.unbenchmarked, vec!["headcount".to_string()]);
    }

    #[test]
    fn configured_weights_override_defaults() {
        let settings = BenchmarkSettings {
            metric_weights: HashMap::from([("net_margin".to_string(), 0.9)]),
            default_weight: 0.05,
        };
        let comparator = BenchmarkComparator::new(&settings);
        assert_eq!(comparator.weight("net_margin"), 0.9);
        assert_eq!(comparator.weight("current_ratio"), 0.15);
        assert_eq!(comparator.weight("unknown"), 0.05);
    }

    #[test]
    fn peer_distribution_from_values() {
        let values: Vec<f64> = (1..=11).map(|v| v as f64).collect();
        let b = peer_distribution("revenue_growth", &values, "peer").unwrap();
        assert_eq!(b.p50, 6.0);
        assert_eq!(b.p25, 3.5);
        assert_eq!(b.sample_size, 11);
        assert!(peer_distribution("revenue_growth", &[1.0], "peer").is_err());
    }
}
