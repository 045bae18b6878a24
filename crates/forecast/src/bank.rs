use crate::error::ForecastError;
use crate::factory::create_strategy;
use crate::result::ForecastResult;
use crate::ForecastStrategy;
use analytics::{CleanedSeries, SeasonalDecomposer};
use configuration::{DecompositionSettings, ForecastSettings};

/// Runs the configured strategy with seasonal handling around it.
///
/// The series is decomposed first. When the seasonal component is material the
/// strategy sees the seasonally adjusted values and the phase-matched seasonal effect
/// is added back to every projected point. The decomposition is attached either way.
pub struct ForecastBank {
    strategy: Box<dyn ForecastStrategy>,
    decomposer: SeasonalDecomposer,
    seasonal_threshold: f64,
    confidence_level: f64,
}

impl ForecastBank {
    pub fn new(
        strategy: Box<dyn ForecastStrategy>,
        decomposer: SeasonalDecomposer,
        seasonal_threshold: f64,
        confidence_level: f64,
    ) -> Result<Self, ForecastError> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameters(format!(
                "confidence level must be in (0, 1), got {confidence_level}"
            )));
        }
        Ok(Self {
            strategy,
            decomposer,
            seasonal_threshold,
            confidence_level,
        })
    }

    pub fn from_settings(
        forecast: &ForecastSettings,
        decomposition: &DecompositionSettings,
    ) -> Result<Self, ForecastError> {
        let strategy = create_strategy(forecast.model, forecast)?;
        let decomposer = SeasonalDecomposer::new(decomposition)?;
        Self::new(
            strategy,
            decomposer,
            decomposition.seasonal_strength_threshold,
            forecast.confidence_level,
        )
    }

    pub fn strategy(&self) -> &dyn ForecastStrategy {
        self.strategy.as_ref()
    }

    pub fn forecast(
        &self,
        series: &CleanedSeries,
        horizon: usize,
    ) -> Result<ForecastResult, ForecastError> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameters(
                "forecast horizon must be at least 1".to_string(),
            ));
        }

        let decomposition = match self.decomposer.decompose(&series.values) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::debug!(metric = %series.series.metric, error = %e, "Decomposition skipped");
                None
            }
        };

        let seasonal = decomposition
            .as_ref()
            .filter(|d| d.is_material(self.seasonal_threshold));

        let mut result = match seasonal {
            Some(d) => {
                // Clamp only once the seasonal component is back in.
                let mut adjusted = series.with_values(d.seasonally_adjusted())?;
                adjusted.series.non_negative = false;
                let mut result =
                    self.strategy
                        .fit_and_forecast(&adjusted, horizon, self.confidence_level)?;
                let non_negative = series.series.non_negative;
                for (h, point) in result.points.iter_mut().enumerate() {
                    point.value += d.projected_seasonal(h + 1);
                    if non_negative && point.value < 0.0 {
                        point.value = 0.0;
                        point.clamped = true;
                    }
                }
                if result.any_clamped() {
                    result.notes.push("negative projections clamped to zero".to_string());
                }
                result.notes.push(format!(
                    "seasonally adjusted (period {}, strength {:.2})",
                    d.period, d.seasonal_strength
                ));
                result
            }
            None => self
                .strategy
                .fit_and_forecast(series, horizon, self.confidence_level)?,
        };

        result.decomposition = decomposition;

        tracing::debug!(
            client_id = %result.client_id,
            metric = %result.metric,
            model = %result.model,
            accuracy = result.accuracy,
            degraded = result.degraded,
            "Forecast produced"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cleaned;
    use core_types::ModelId;

    fn bank() -> ForecastBank {
        ForecastBank::from_settings(&ForecastSettings::default(), &DecompositionSettings::default())
            .unwrap()
    }

    #[test]
    fn attaches_decomposition_of_matching_length() {
        let values = [100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0];
        let result = bank().forecast(&cleaned("revenue", &values), 3).unwrap();

        assert_eq!(result.model, ModelId::Ensemble);
        assert_eq!(result.points.len(), 3);
        let decomposition = result.decomposition.expect("decomposition attached");
        assert_eq!(decomposition.len(), values.len());
    }

    #[test]
    fn strong_seasonality_is_carried_into_the_forecast() {
        let pattern = [10.0, 30.0, 50.0, 30.0, 10.0, -10.0, -30.0, -50.0, -30.0, -10.0, 0.0, 20.0];
        let values: Vec<f64> = (0..48).map(|i| 500.0 + pattern[i % 12]).collect();
        let result = bank().forecast(&cleaned("revenue", &values), 12).unwrap();

        assert!(result.notes.iter().any(|n| n.starts_with("seasonally adjusted")));
        let projected = result.values();
        let peak = projected.iter().cloned().fold(f64::MIN, f64::max);
        let trough = projected.iter().cloned().fold(f64::MAX, f64::min);
        assert!(peak - trough > 50.0);
    }

    #[test]
    fn declining_seasonal_series_clamps_after_seasonal_readd() {
        let pattern = [10.0, 30.0, 50.0, 30.0, 10.0, -10.0, -30.0, -50.0, -30.0, -10.0, 0.0, 20.0];
        let values: Vec<f64> = (0..48)
            .map(|i| 10.0 + 11.0 * (47 - i) as f64 + pattern[i % 12])
            .collect();
        let mut series = cleaned("revenue", &values);
        series.series.non_negative = true;
        let result = bank().forecast(&series, 12).unwrap();
        let decomposition = result.decomposition.clone().expect("decomposition attached");

        for point in &result.points {
            assert!(point.value >= 0.0);
            if point.clamped {
                assert_eq!(point.value, 0.0);
            }
        }
        assert!(result.any_clamped());
        assert!(result.notes.iter().any(|n| n == "negative projections clamped to zero"));
        // A negative trend beneath a positive seasonal peak stays visible.
        assert!(result.points.iter().enumerate().any(|(h, p)| {
            let seasonal = decomposition.projected_seasonal(h + 1);
            seasonal > 5.0 && p.value > 0.0 && p.value < seasonal - 1.0
        }));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let err = bank()
            .forecast(&cleaned("revenue", &[1.0, 2.0, 3.0, 4.0]), 0)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameters(_)));
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = bank()
            .forecast(&cleaned("revenue", &[1.0, 2.0, 3.0]), 2)
            .unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit { .. }));
    }
}
