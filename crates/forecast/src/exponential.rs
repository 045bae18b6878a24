use crate::error::ForecastError;
use crate::result::{accuracy_from_fit, assemble, ForecastResult};
use crate::ForecastStrategy;
use analytics::CleanedSeries;
use core_types::ModelId;

const ALPHA_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const BETA_GRID: [f64; 5] = [0.05, 0.1, 0.2, 0.3, 0.5];

/// Holt's linear (double) exponential smoothing.
///
/// Level and trend smoothing factors are picked from a fixed grid by minimising the
/// one-step-ahead squared error, so no configuration is needed.
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    min_points: usize,
}

impl Default for ExponentialSmoothing {
    fn default() -> Self {
        Self { min_points: 4 }
    }
}

struct HoltFit {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    fitted: Vec<f64>,
    sse: f64,
}

impl ExponentialSmoothing {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(values: &[f64], alpha: f64, beta: f64) -> HoltFit {
        let mut level = values[0];
        let mut trend = values[1] - values[0];
        let mut fitted = Vec::with_capacity(values.len() - 1);
        let mut sse = 0.0;

        for &y in &values[1..] {
            let prediction = level + trend;
            fitted.push(prediction);
            sse += (y - prediction).powi(2);

            let previous_level = level;
            level = alpha * y + (1.0 - alpha) * (level + trend);
            trend = beta * (level - previous_level) + (1.0 - beta) * trend;
        }

        HoltFit { alpha, beta, level, trend, fitted, sse }
    }
}

impl ForecastStrategy for ExponentialSmoothing {
    fn id(&self) -> ModelId {
        ModelId::ExponentialSmoothing
    }

    fn fit_and_forecast(
        &self,
        series: &CleanedSeries,
        horizon: usize,
        confidence: f64,
    ) -> Result<ForecastResult, ForecastError> {
        let values = &series.values;
        if values.len() < self.min_points {
            return Err(ForecastError::InsufficientData {
                model: self.id(),
                required: self.min_points,
                actual: values.len(),
            });
        }

        let best = ALPHA_GRID
            .iter()
            .flat_map(|&a| BETA_GRID.iter().map(move |&b| (a, b)))
            .map(|(a, b)| Self::run(values, a, b))
            .filter(|fit| fit.sse.is_finite())
            .min_by(|x, y| x.sse.total_cmp(&y.sse))
            .ok_or_else(|| ForecastError::FitFailed {
                model: self.id(),
                reason: "no smoothing parameters produced a finite fit".to_string(),
            })?;

        let accuracy = accuracy_from_fit(&values[1..], &best.fitted);
        let projections: Vec<f64> = (1..=horizon)
            .map(|h| best.level + h as f64 * best.trend)
            .collect();

        tracing::debug!(
            metric = %series.series.metric,
            alpha = best.alpha,
            beta = best.beta,
            accuracy,
            "Holt smoothing fitted"
        );

        Ok(assemble(series, self.id(), projections, accuracy, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cleaned;

    #[test]
    fn linear_input_is_tracked_exactly() {
        let values: Vec<f64> = (0..10).map(|i| 10.0 + 2.5 * i as f64).collect();
        let result = ExponentialSmoothing::new()
            .fit_and_forecast(&cleaned("revenue", &values), 2, 0.9)
            .unwrap();

        let projected = result.values();
        assert!((projected[0] - 35.0).abs() < 1e-9);
        assert!((projected[1] - 37.5).abs() < 1e-9);
        assert!((result.accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn noisy_input_yields_bounded_accuracy() {
        let values = [100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0];
        let result = ExponentialSmoothing::new()
            .fit_and_forecast(&cleaned("revenue", &values), 3, 0.95)
            .unwrap();

        assert!(result.accuracy > 0.0 && result.accuracy < 1.0);
        assert!(result.values().iter().all(|v| v.is_finite()));
        assert!(result.points.iter().all(|p| p.confidence > 0.0 && p.confidence <= 1.0));
    }
}
