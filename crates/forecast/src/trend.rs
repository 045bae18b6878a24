use crate::error::ForecastError;
use crate::result::{accuracy_from_fit, assemble, ForecastResult};
use crate::ForecastStrategy;
use analytics::{stats, CleanedSeries};
use core_types::ModelId;

/// Bound on the AR(1) coefficient so projections stay stationary around the trend.
const MAX_PHI: f64 = 0.95;

/// Linear trend with an AR(1) model of the residuals.
///
/// `ŷ(n+h) = a + b·(n-1+h) + φ^h · r(n-1)`: the last deviation from trend decays
/// geometrically, so short-term momentum fades into the long-run line.
#[derive(Debug, Clone)]
pub struct TrendExtrapolation {
    min_points: usize,
}

impl Default for TrendExtrapolation {
    fn default() -> Self {
        Self { min_points: 4 }
    }
}

impl TrendExtrapolation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForecastStrategy for TrendExtrapolation {
    fn id(&self) -> ModelId {
        ModelId::TrendExtrapolation
    }

    fn fit_and_forecast(
        &self,
        series: &CleanedSeries,
        horizon: usize,
        confidence: f64,
    ) -> Result<ForecastResult, ForecastError> {
        let values = &series.values;
        let n = values.len();
        if n < self.min_points {
            return Err(ForecastError::InsufficientData {
                model: self.id(),
                required: self.min_points,
                actual: n,
            });
        }

        let (intercept, slope) = stats::linear_fit(values).ok_or_else(|| ForecastError::FitFailed {
            model: self.id(),
            reason: "linear regression is undefined".to_string(),
        })?;
        let line = |t: f64| intercept + slope * t;

        let residuals: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(t, v)| v - line(t as f64))
            .collect();

        let num: f64 = residuals.windows(2).map(|w| w[1] * w[0]).sum();
        let den: f64 = residuals[..n - 1].iter().map(|r| r * r).sum();
        let phi = if den < f64::EPSILON {
            0.0
        } else {
            (num / den).clamp(-MAX_PHI, MAX_PHI)
        };

        let fitted: Vec<f64> = (1..n)
            .map(|t| line(t as f64) + phi * residuals[t - 1])
            .collect();
        let accuracy = accuracy_from_fit(&values[1..], &fitted);

        let last_residual = residuals[n - 1];
        let projections: Vec<f64> = (1..=horizon)
            .map(|h| line((n - 1 + h) as f64) + phi.powi(h as i32) * last_residual)
            .collect();

        if projections.iter().any(|v| !v.is_finite()) || !accuracy.is_finite() {
            return Err(ForecastError::FitFailed {
                model: self.id(),
                reason: "non-finite projection".to_string(),
            });
        }

        tracing::debug!(metric = %series.series.metric, intercept, slope, phi, accuracy, "Trend model fitted");

        Ok(assemble(series, self.id(), projections, accuracy, confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cleaned;

    #[test]
    fn extrapolates_a_straight_line() {
        let values: Vec<f64> = (0..8).map(|i| 50.0 + 4.0 * i as f64).collect();
        let result = TrendExtrapolation::new()
            .fit_and_forecast(&cleaned("revenue", &values), 3, 0.95)
            .unwrap();

        let projected = result.values();
        assert!((projected[0] - 82.0).abs() < 1e-6);
        assert!((projected[2] - 90.0).abs() < 1e-6);
        assert!((result.accuracy - 1.0).abs() < 1e-9);
        assert_eq!(result.horizon, 3);
    }

    #[test]
    fn clamps_negative_projections_of_non_negative_metrics() {
        let values: Vec<f64> = (0..6).map(|i| 50.0 - 10.0 * i as f64).collect();
        let result = TrendExtrapolation::new()
            .fit_and_forecast(&cleaned("revenue", &values), 4, 0.95)
            .unwrap();

        assert!(result.values().iter().all(|v| *v >= 0.0));
        assert!(result.any_clamped());
        assert!(!result.notes.is_empty());
    }

    #[test]
    fn signed_metrics_may_go_negative() {
        let values: Vec<f64> = (0..6).map(|i| 50.0 - 10.0 * i as f64).collect();
        let result = TrendExtrapolation::new()
            .fit_and_forecast(&cleaned("cash_flow", &values), 2, 0.95)
            .unwrap();
        assert!(result.values()[1] < 0.0);
        assert!(!result.any_clamped());
    }

    #[test]
    fn needs_four_points() {
        let err = TrendExtrapolation::new()
            .fit_and_forecast(&cleaned("revenue", &[1.0, 2.0, 3.0]), 2, 0.95)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { .. }));
    }
}
