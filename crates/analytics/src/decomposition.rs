use crate::error::AnalyticsError;
use crate::stats;
use configuration::DecompositionSettings;
use serde::{Deserialize, Serialize};

/// Additive decomposition: `value[i] = trend[i] + seasonal[i] + irregular[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub irregular: Vec<f64>,
    pub period: usize,
    /// Seasonal effect per cycle phase; empty when no seasonality was estimated.
    pub seasonal_cycle: Vec<f64>,
    /// Ratio of seasonal variance to irregular variance.
    pub seasonal_strength: f64,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Whether seasonal adjustment is worth applying at the given strength threshold.
    pub fn is_material(&self, threshold: f64) -> bool {
        !self.seasonal_cycle.is_empty() && self.seasonal_strength > threshold
    }

    /// The seasonal effect `steps_ahead` periods after the last observation (1-based).
    pub fn projected_seasonal(&self, steps_ahead: usize) -> f64 {
        if self.seasonal_cycle.is_empty() || self.is_empty() {
            return 0.0;
        }
        let index = self.len() - 1 + steps_ahead;
        self.seasonal_cycle[index % self.period]
    }

    /// Values with the seasonal component removed.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.irregular)
            .map(|(t, e)| t + e)
            .collect()
    }
}

/// Splits a cleaned series into LOESS trend, phase-averaged seasonal and residual parts.
#[derive(Debug, Clone)]
pub struct SeasonalDecomposer {
    period: usize,
    span: f64,
}

impl Default for SeasonalDecomposer {
    fn default() -> Self {
        Self { period: 12, span: 0.5 }
    }
}

impl SeasonalDecomposer {
    pub fn new(settings: &DecompositionSettings) -> Result<Self, AnalyticsError> {
        if settings.period < 2 {
            return Err(AnalyticsError::InvalidParameters(
                "seasonal period must be at least 2".to_string(),
            ));
        }
        if !(settings.loess_span > 0.0 && settings.loess_span <= 1.0) {
            return Err(AnalyticsError::InvalidParameters(
                "loess span must be in (0, 1]".to_string(),
            ));
        }
        Ok(Self {
            period: settings.period,
            span: settings.loess_span,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn decompose(&self, values: &[f64]) -> Result<Decomposition, AnalyticsError> {
        let n = values.len();
        if n < 4 {
            return Err(AnalyticsError::InsufficientData {
                context: "seasonal decomposition".to_string(),
                required: 4,
                actual: n,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::Calculation(
                "decomposition input contains non-finite values".to_string(),
            ));
        }

        let trend = loess(values, self.span);
        let detrended: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();

        // Fewer than two full cycles cannot separate seasonality from noise.
        let seasonal_cycle = if n >= 2 * self.period {
            phase_means(&detrended, self.period)
        } else {
            Vec::new()
        };
        let seasonal: Vec<f64> = if seasonal_cycle.is_empty() {
            vec![0.0; n]
        } else {
            (0..n).map(|i| seasonal_cycle[i % self.period]).collect()
        };

        let irregular: Vec<f64> = detrended.iter().zip(&seasonal).map(|(d, s)| d - s).collect();

        let seasonal_var = stats::variance(&seasonal).unwrap_or(0.0);
        let irregular_var = stats::variance(&irregular).unwrap_or(0.0);
        let seasonal_strength = seasonal_var / irregular_var.max(f64::EPSILON);

        tracing::debug!(
            points = n,
            period = self.period,
            seasonal_strength,
            "Series decomposed"
        );

        Ok(Decomposition {
            trend,
            seasonal,
            irregular,
            period: self.period,
            seasonal_cycle,
            seasonal_strength,
        })
    }
}

/// Mean detrended value per phase, centred so a full cycle sums to zero.
fn phase_means(detrended: &[f64], period: usize) -> Vec<f64> {
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, d) in detrended.iter().enumerate() {
        sums[i % period] += d;
        counts[i % period] += 1;
    }
    let means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| if *c == 0 { 0.0 } else { s / *c as f64 })
        .collect();
    let centre = stats::mean(&means).unwrap_or(0.0);
    means.into_iter().map(|m| m - centre).collect()
}

/// Local linear regression with tricube weights over the `span` fraction of points
/// nearest to each index.
fn loess(values: &[f64], span: f64) -> Vec<f64> {
    let n = values.len();
    let k = ((span * n as f64).ceil() as usize).clamp(3.min(n), n);

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(k / 2).min(n - k);
            let hi = lo + k - 1;
            let bandwidth = (i - lo).max(hi - i) as f64 + 1.0;

            let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for j in lo..=hi {
                let d = (j as f64 - i as f64).abs() / bandwidth;
                let w = (1.0 - d.powi(3)).powi(3);
                let x = j as f64;
                sw += w;
                swx += w * x;
                swy += w * values[j];
                swxx += w * x * x;
                swxy += w * x * values[j];
            }

            let denom = sw * swxx - swx * swx;
            if denom.abs() < 1e-12 {
                swy / sw
            } else {
                let slope = (sw * swxy - swx * swy) / denom;
                let intercept = (swy - slope * swx) / sw;
                intercept + slope * i as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn seasonal_series(cycles: usize) -> Vec<f64> {
        (0..cycles * 12)
            .map(|i| 1000.0 + 5.0 * i as f64 + 80.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect()
    }

    #[test]
    fn components_add_back_to_the_input() {
        let inputs = vec![
            vec![100.0, 102.0, 98.0, 101.0, 103.0, 99.0, 104.0],
            seasonal_series(3),
            (0..30).map(|i| ((i * 17) % 13) as f64).collect(),
        ];
        for values in inputs {
            let d = SeasonalDecomposer::default().decompose(&values).unwrap();
            assert_eq!(d.trend.len(), values.len());
            assert_eq!(d.seasonal.len(), values.len());
            assert_eq!(d.irregular.len(), values.len());
            for i in 0..values.len() {
                let sum = d.trend[i] + d.seasonal[i] + d.irregular[i];
                assert!((values[i] - sum).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn linear_series_has_linear_trend_and_no_residual() {
        let values: Vec<f64> = (0..10).map(|i| 10.0 + 3.0 * i as f64).collect();
        let d = SeasonalDecomposer::default().decompose(&values).unwrap();
        for (v, t) in values.iter().zip(&d.trend) {
            assert!((v - t).abs() < 1e-6);
        }
    }

    #[test]
    fn detects_strong_monthly_seasonality() {
        let d = SeasonalDecomposer::default().decompose(&seasonal_series(4)).unwrap();
        assert_eq!(d.seasonal_cycle.len(), 12);
        assert!(d.is_material(1.0), "strength was {}", d.seasonal_strength);
        let cycle_sum: f64 = d.seasonal_cycle.iter().sum();
        assert!(cycle_sum.abs() < 1e-9);
    }

    #[test]
    fn short_series_has_no_seasonal_component() {
        let d = SeasonalDecomposer::default()
            .decompose(&[100.0, 102.0, 98.0, 101.0, 103.0])
            .unwrap();
        assert!(d.seasonal.iter().all(|s| *s == 0.0));
        assert!(!d.is_material(0.0));
        assert_eq!(d.projected_seasonal(3), 0.0);
    }

    #[test]
    fn too_short_input_is_rejected() {
        let err = SeasonalDecomposer::default().decompose(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
    }
}
