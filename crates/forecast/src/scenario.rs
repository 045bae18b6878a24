use crate::error::ForecastError;
use crate::result::ForecastResult;
use analytics::{stats, CleanedSeries};
use chrono::{DateTime, Utc};
use configuration::ScenarioSettings;
use core_types::Polarity;
use serde::{Deserialize, Serialize};

/// Optimistic, most-likely and pessimistic paths around a baseline forecast.
///
/// For higher-is-better metrics `optimistic >= most_likely >= pessimistic` holds at
/// every step; for lower-is-better metrics the inequality is reversed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioBands {
    pub timestamps: Vec<DateTime<Utc>>,
    pub optimistic: Vec<f64>,
    pub most_likely: Vec<f64>,
    pub pessimistic: Vec<f64>,
    /// The capped volatility estimate the bands were derived from.
    pub volatility: f64,
    pub polarity: Polarity,
}

impl ScenarioBands {
    pub fn len(&self) -> usize {
        self.most_likely.len()
    }

    pub fn is_empty(&self) -> bool {
        self.most_likely.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    volatility_multiplier: f64,
    max_volatility: f64,
}

impl Default for ScenarioGenerator {
    fn default() -> Self {
        Self {
            volatility_multiplier: 1.5,
            max_volatility: 1.0,
        }
    }
}

impl ScenarioGenerator {
    pub fn new(settings: &ScenarioSettings) -> Result<Self, ForecastError> {
        if !(settings.volatility_multiplier >= 0.0) || !(settings.max_volatility > 0.0) {
            return Err(ForecastError::InvalidParameters(
                "scenario multiplier must be non-negative and max volatility positive".to_string(),
            ));
        }
        Ok(Self {
            volatility_multiplier: settings.volatility_multiplier,
            max_volatility: settings.max_volatility,
        })
    }

    /// Coefficient of variation of period-over-period returns, capped.
    pub fn volatility(&self, history: &[f64]) -> f64 {
        let returns = stats::returns(history);
        stats::coefficient_of_variation(&returns)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
            .min(self.max_volatility)
    }

    pub fn generate(&self, baseline: &ForecastResult, history: &CleanedSeries) -> ScenarioBands {
        let volatility = self.volatility(&history.values);
        let band = self.volatility_multiplier * volatility;

        let mut optimistic = Vec::with_capacity(baseline.points.len());
        let mut pessimistic = Vec::with_capacity(baseline.points.len());

        for point in &baseline.points {
            let (high, low) = spread(point.value, band);
            match baseline.polarity {
                Polarity::HigherIsBetter => {
                    optimistic.push(high);
                    pessimistic.push(low);
                }
                Polarity::LowerIsBetter => {
                    optimistic.push(low);
                    pessimistic.push(high);
                }
            }
        }

        tracing::debug!(metric = %baseline.metric, volatility, "Scenario bands generated");

        ScenarioBands {
            timestamps: baseline.points.iter().map(|p| p.timestamp).collect(),
            optimistic,
            most_likely: baseline.values(),
            pessimistic,
            volatility,
            polarity: baseline.polarity,
        }
    }
}

/// Returns `(high, low)` around `value` with a relative half-width of `band`.
/// A non-negative baseline never produces a negative band.
fn spread(value: f64, band: f64) -> (f64, f64) {
    if value >= 0.0 {
        (value * (1.0 + band), (value * (1.0 - band)).max(0.0))
    } else {
        (value * (1.0 - band), value * (1.0 + band))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cleaned;
    use crate::{ForecastStrategy, TrendExtrapolation};

    const HISTORY: [f64; 7] = [100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0];

    fn bands_for(metric: &str, values: &[f64]) -> ScenarioBands {
        let series = cleaned(metric, values);
        let baseline = TrendExtrapolation::new().fit_and_forecast(&series, 4, 0.95).unwrap();
        ScenarioGenerator::default().generate(&baseline, &series)
    }

    #[test]
    fn higher_is_better_bands_are_ordered() {
        let bands = bands_for("revenue", &HISTORY);
        assert_eq!(bands.len(), 4);
        assert!(bands.volatility > 0.0);
        for i in 0..bands.len() {
            assert!(bands.optimistic[i] >= bands.most_likely[i]);
            assert!(bands.most_likely[i] >= bands.pessimistic[i]);
            assert!(bands.pessimistic[i] >= 0.0);
        }
    }

    #[test]
    fn lower_is_better_bands_are_inverted() {
        let bands = bands_for("debt_to_equity", &[1.2, 1.4, 1.1, 1.3, 1.5, 1.2]);
        assert_eq!(bands.polarity, Polarity::LowerIsBetter);
        for i in 0..bands.len() {
            assert!(bands.optimistic[i] <= bands.most_likely[i]);
            assert!(bands.most_likely[i] <= bands.pessimistic[i]);
        }
    }

    #[test]
    fn negative_baseline_keeps_ordering() {
        let values: Vec<f64> = (0..6).map(|i| -10.0 - 5.0 * i as f64 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let bands = bands_for("cash_flow", &values);
        for i in 0..bands.len() {
            assert!(bands.most_likely[i] < 0.0);
            assert!(bands.optimistic[i] >= bands.most_likely[i]);
            assert!(bands.most_likely[i] >= bands.pessimistic[i]);
        }
    }

    #[test]
    fn volatility_is_capped() {
        let generator = ScenarioGenerator::default();
        assert_eq!(generator.volatility(&[1.0, 100.0, 1.0, 100.0, 1.0]), 1.0);
        assert_eq!(generator.volatility(&[5.0, 5.0, 5.0, 5.0]), 0.0);
    }
}
