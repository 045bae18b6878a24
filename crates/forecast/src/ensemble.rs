use crate::error::ForecastError;
use crate::result::{ForecastPoint, ForecastResult};
use crate::ForecastStrategy;
use analytics::CleanedSeries;
use core_types::ModelId;

/// Combines several strategies into one forecast, weighting each by its accuracy.
///
/// If some constituents fail the rest still produce a result, marked `degraded`,
/// with confidence scaled down by `degraded_penalty`. Only when every constituent
/// fails does the ensemble return `ForecastError::ModelFit`.
pub struct EnsembleStrategy {
    members: Vec<Box<dyn ForecastStrategy>>,
    degraded_penalty: f64,
}

impl std::fmt::Debug for EnsembleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleStrategy")
            .field("members", &self.member_ids())
            .field("degraded_penalty", &self.degraded_penalty)
            .finish()
    }
}

impl EnsembleStrategy {
    pub fn new(
        members: Vec<Box<dyn ForecastStrategy>>,
        degraded_penalty: f64,
    ) -> Result<Self, ForecastError> {
        if members.len() < 2 {
            return Err(ForecastError::InvalidParameters(
                "an ensemble needs at least two members".to_string(),
            ));
        }
        if !(degraded_penalty > 0.0 && degraded_penalty <= 1.0) {
            return Err(ForecastError::InvalidParameters(
                "degraded penalty must be in (0, 1]".to_string(),
            ));
        }
        Ok(Self {
            members,
            degraded_penalty,
        })
    }

    pub fn member_ids(&self) -> Vec<ModelId> {
        self.members.iter().map(|m| m.id()).collect()
    }
}

impl ForecastStrategy for EnsembleStrategy {
    fn id(&self) -> ModelId {
        ModelId::Ensemble
    }

    fn fit_and_forecast(
        &self,
        series: &CleanedSeries,
        horizon: usize,
        confidence: f64,
    ) -> Result<ForecastResult, ForecastError> {
        let mut fits = Vec::new();
        let mut failures = Vec::new();
        for member in &self.members {
            match member.fit_and_forecast(series, horizon, confidence) {
                Ok(result) => fits.push(result),
                Err(e) => {
                    tracing::warn!(metric = %series.series.metric, model = %member.id(), error = %e, "Ensemble member failed");
                    failures.push((member.id(), e.to_string()));
                }
            }
        }

        if fits.is_empty() {
            return Err(ForecastError::ModelFit {
                attempted: self.member_ids(),
                last_cause: failures
                    .last()
                    .map(|(_, cause)| cause.clone())
                    .unwrap_or_default(),
            });
        }

        let total_accuracy: f64 = fits.iter().map(|f| f.accuracy).sum();
        let weights: Vec<f64> = if total_accuracy > 0.0 {
            fits.iter().map(|f| f.accuracy / total_accuracy).collect()
        } else {
            vec![1.0 / fits.len() as f64; fits.len()]
        };

        let degraded = !failures.is_empty();
        let penalty = if degraded { self.degraded_penalty } else { 1.0 };

        let points = (0..fits[0].points.len())
            .map(|i| {
                let value = fits
                    .iter()
                    .zip(&weights)
                    .map(|(f, w)| f.points[i].value * w)
                    .sum();
                let best_confidence = fits
                    .iter()
                    .map(|f| f.points[i].confidence)
                    .fold(0.0, f64::max);
                ForecastPoint {
                    timestamp: fits[0].points[i].timestamp,
                    value,
                    confidence: (best_confidence * penalty).clamp(0.0, 1.0),
                    clamped: fits.iter().any(|f| f.points[i].clamped),
                }
            })
            .collect::<Vec<_>>();

        let accuracy = total_accuracy / fits.len() as f64;

        let mut notes: Vec<String> = fits.iter().flat_map(|f| f.notes.iter().cloned()).collect();
        notes.sort();
        notes.dedup();
        for (model, cause) in &failures {
            notes.push(format!("{model} excluded: {cause}"));
        }

        Ok(ForecastResult {
            client_id: series.series.client_id,
            metric: series.series.metric.clone(),
            polarity: series.series.polarity,
            model: self.id(),
            horizon: points.len(),
            points,
            accuracy,
            decomposition: None,
            degraded,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cleaned;
    use crate::{ExponentialSmoothing, TrendExtrapolation};

    struct Failing;

    impl ForecastStrategy for Failing {
        fn id(&self) -> ModelId {
            ModelId::ExponentialSmoothing
        }

        fn fit_and_forecast(
            &self,
            _: &CleanedSeries,
            _: usize,
            _: f64,
        ) -> Result<ForecastResult, ForecastError> {
            Err(ForecastError::FitFailed {
                model: ModelId::ExponentialSmoothing,
                reason: "synthetic".to_string(),
            })
        }
    }

    fn default_ensemble() -> EnsembleStrategy {
        EnsembleStrategy::new(
            vec![
                Box::new(TrendExtrapolation::new()),
                Box::new(ExponentialSmoothing::new()),
            ],
            0.8,
        )
        .unwrap()
    }

    #[test]
    fn short_noisy_series_produces_bounded_forecast() {
        let series = cleaned("revenue", &[100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0]);
        let result = default_ensemble().fit_and_forecast(&series, 3, 0.95).unwrap();

        assert_eq!(result.points.len(), 3);
        assert!(result.values().iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(result.accuracy > 0.0 && result.accuracy <= 1.0);
        assert!(!result.degraded);
    }

    #[test]
    fn combined_value_lies_between_members() {
        let series = cleaned("revenue", &[100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0]);
        let trend = TrendExtrapolation::new().fit_and_forecast(&series, 3, 0.95).unwrap();
        let holt = ExponentialSmoothing::new().fit_and_forecast(&series, 3, 0.95).unwrap();
        let combined = default_ensemble().fit_and_forecast(&series, 3, 0.95).unwrap();

        for i in 0..3 {
            let lo = trend.points[i].value.min(holt.points[i].value) - 1e-9;
            let hi = trend.points[i].value.max(holt.points[i].value) + 1e-9;
            assert!((lo..=hi).contains(&combined.points[i].value));
        }
    }

    #[test]
    fn failed_member_degrades_confidence() {
        let series = cleaned("revenue", &[100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0]);
        let healthy = TrendExtrapolation::new().fit_and_forecast(&series, 2, 0.95).unwrap();
        let ensemble =
            EnsembleStrategy::new(vec![Box::new(TrendExtrapolation::new()), Box::new(Failing)], 0.8)
                .unwrap();

        let result = ensemble.fit_and_forecast(&series, 2, 0.95).unwrap();
        assert!(result.degraded);
        assert!((result.points[0].confidence - healthy.points[0].confidence * 0.8).abs() < 1e-12);
        assert!(result.notes.iter().any(|n| n.contains("excluded")));
    }

    #[test]
    fn all_members_failing_is_a_model_fit_error() {
        let series = cleaned("revenue", &[1.0, 2.0, 3.0, 4.0]);
        let ensemble = EnsembleStrategy::new(vec![Box::new(Failing), Box::new(Failing)], 0.8).unwrap();
        let err = ensemble.fit_and_forecast(&series, 2, 0.95).unwrap_err();
        match err {
            ForecastError::ModelFit { attempted, last_cause } => {
                assert_eq!(attempted.len(), 2);
                assert!(last_cause.contains("synthetic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_single_member() {
        assert!(EnsembleStrategy::new(vec![Box::new(TrendExtrapolation::new())], 0.8).is_err());
    }
}
