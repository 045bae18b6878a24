use crate::calendar::future_timestamps;
use analytics::{CleanedSeries, Decomposition};
use chrono::{DateTime, Utc};
use core_types::{ModelId, Polarity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relative confidence lost per additional step into the future.
const CONFIDENCE_DECAY_PER_STEP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub confidence: f64,
    /// The model projected a negative value for a non-negative metric.
    pub clamped: bool,
}

/// The output of any `ForecastStrategy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub client_id: Uuid,
    pub metric: String,
    pub polarity: Polarity,
    pub model: ModelId,
    pub horizon: usize,
    pub points: Vec<ForecastPoint>,
    /// In-sample accuracy estimate in `[0, 1]`.
    pub accuracy: f64,
    pub decomposition: Option<Decomposition>,
    /// Set by the ensemble when one or more constituents failed.
    pub degraded: bool,
    pub notes: Vec<String>,
}

impl ForecastResult {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn mean_confidence(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.iter().map(|p| p.confidence).sum::<f64>() / self.points.len() as f64
    }

    pub fn any_clamped(&self) -> bool {
        self.points.iter().any(|p| p.clamped)
    }
}

/// Assembles a result from raw projections: attaches timestamps and per-point
/// confidence, and clamps negative values of non-negative metrics.
pub(crate) fn assemble(
    series: &CleanedSeries,
    model: ModelId,
    projections: Vec<f64>,
    accuracy: f64,
    confidence_level: f64,
) -> ForecastResult {
    let timestamps = future_timestamps(&series.series.timestamps(), projections.len());
    let non_negative = series.series.non_negative;

    let points = timestamps
        .into_iter()
        .zip(projections)
        .enumerate()
        .map(|(i, (timestamp, raw))| {
            let clamped = non_negative && raw < 0.0;
            ForecastPoint {
                timestamp,
                value: if clamped { 0.0 } else { raw },
                confidence: point_confidence(confidence_level, accuracy, i + 1),
                clamped,
            }
        })
        .collect::<Vec<_>>();

    let mut notes = Vec::new();
    if points.iter().any(|p| p.clamped) {
        notes.push("negative projections clamped to zero".to_string());
    }

    ForecastResult {
        client_id: series.series.client_id,
        metric: series.series.metric.clone(),
        polarity: series.series.polarity,
        model,
        horizon: points.len(),
        points,
        accuracy,
        decomposition: None,
        degraded: false,
        notes,
    }
}

pub(crate) fn point_confidence(level: f64, accuracy: f64, steps_ahead: usize) -> f64 {
    let decay = 1.0 / (1.0 + CONFIDENCE_DECAY_PER_STEP * (steps_ahead.saturating_sub(1)) as f64);
    (level * accuracy * decay).clamp(0.0, 1.0)
}

/// Accuracy as `1 / (1 + WAPE)` of one-step-ahead fitted values; always in `(0, 1]`.
pub(crate) fn accuracy_from_fit(actual: &[f64], fitted: &[f64]) -> f64 {
    let abs_error: f64 = actual.iter().zip(fitted).map(|(a, f)| (a - f).abs()).sum();
    let scale: f64 = actual.iter().map(|a| a.abs()).sum();
    let wape = if scale < f64::EPSILON {
        if abs_error < f64::EPSILON { 0.0 } else { 1.0 }
    } else {
        abs_error / scale
    };
    1.0 / (1.0 + wape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_has_full_accuracy() {
        assert_eq!(accuracy_from_fit(&[1.0, 2.0], &[1.0, 2.0]), 1.0);
        let a = accuracy_from_fit(&[100.0, 100.0], &[90.0, 110.0]);
        assert!((a - 1.0 / 1.1).abs() < 1e-12);
    }

    #[test]
    fn confidence_decays_with_distance() {
        let near = point_confidence(0.95, 0.9, 1);
        let far = point_confidence(0.95, 0.9, 6);
        assert!(near > far);
        assert!((near - 0.855).abs() < 1e-12);
    }
}
