use crate::error::AnalyticsError;
use crate::stats;
use configuration::PreprocessingSettings;
use core_types::{MetricSeries, PointFlag};
use serde::{Deserialize, Serialize};

/// A gap-free, outlier-adjusted, smoothed copy of a raw series.
///
/// `series` keeps the original timestamps with every value populated and the
/// per-point flags set; `values` is the same data as a plain vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedSeries {
    pub series: MetricSeries,
    pub values: Vec<f64>,
    /// Indices that were missing in the raw series.
    pub gap_filled: Vec<usize>,
    /// Indices replaced by the outlier filter.
    pub outliers: Vec<usize>,
}

impl CleanedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// A copy carrying different values (e.g. a seasonally adjusted version).
    /// `values` must have the same length as the series.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, AnalyticsError> {
        if values.len() != self.values.len() {
            return Err(AnalyticsError::InvalidParameters(format!(
                "replacement values have length {}, series has {}",
                values.len(),
                self.values.len()
            )));
        }
        let mut series = self.series.clone();
        for (point, v) in series.points.iter_mut().zip(&values) {
            point.value = Some(*v);
        }
        Ok(Self {
            series,
            values,
            gap_filled: self.gap_filled.clone(),
            outliers: self.outliers.clone(),
        })
    }
}

/// Cleans raw metric history: linear gap-filling, IQR outlier correction and a
/// single pass of a centred moving average.
#[derive(Debug, Clone)]
pub struct SeriesPreprocessor {
    smoothing_window: usize,
    iqr_multiplier: f64,
    min_points: usize,
}

impl Default for SeriesPreprocessor {
    fn default() -> Self {
        Self {
            smoothing_window: 3,
            iqr_multiplier: 1.5,
            min_points: 4,
        }
    }
}

impl SeriesPreprocessor {
    /// Creates a preprocessor from configuration, validating the parameters.
    pub fn new(settings: &PreprocessingSettings) -> Result<Self, AnalyticsError> {
        if settings.smoothing_window == 0 || settings.smoothing_window % 2 == 0 {
            return Err(AnalyticsError::InvalidParameters(
                "smoothing window must be a positive odd number".to_string(),
            ));
        }
        if !(settings.iqr_multiplier > 0.0) {
            return Err(AnalyticsError::InvalidParameters(
                "iqr multiplier must be positive".to_string(),
            ));
        }
        Ok(Self {
            smoothing_window: settings.smoothing_window,
            iqr_multiplier: settings.iqr_multiplier,
            min_points: settings.min_points.max(4),
        })
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    /// Produces the cleaned series. Output length always equals input length.
    pub fn clean(&self, raw: &MetricSeries) -> Result<CleanedSeries, AnalyticsError> {
        let observed = raw.observed_count();
        if observed < self.min_points {
            return Err(AnalyticsError::InsufficientData {
                context: format!("preprocessing '{}'", raw.metric),
                required: self.min_points,
                actual: observed,
            });
        }

        let (mut values, gap_filled) = fill_gaps(&raw.raw_values());
        let outliers = self.correct_outliers(&mut values);
        let mut values = self.smooth(&values);

        let mut series = raw.clone();
        for (i, (point, v)) in series.points.iter_mut().zip(values.iter_mut()).enumerate() {
            if gap_filled.contains(&i) {
                point.flags.push(PointFlag::GapFilled);
            }
            if outliers.contains(&i) {
                point.flags.push(PointFlag::OutlierCorrected);
            }
            if raw.non_negative && *v < 0.0 {
                *v = 0.0;
                point.flags.push(PointFlag::ClampedToZero);
            }
            point.value = Some(*v);
        }

        tracing::debug!(
            metric = %raw.metric,
            points = values.len(),
            gaps = gap_filled.len(),
            outliers = outliers.len(),
            "Series cleaned"
        );

        Ok(CleanedSeries {
            series,
            values,
            gap_filled,
            outliers,
        })
    }

    /// Replaces points deviating from their local mean by more than `k × IQR`.
    ///
    /// Works greedily, largest deviation first, recomputing local means after each
    /// replacement so a single spike does not drag its neighbours over the threshold.
    fn correct_outliers(&self, values: &mut [f64]) -> Vec<usize> {
        let n = values.len();
        let Some((q1, q3)) = stats::quartiles(values) else {
            return Vec::new();
        };
        let threshold = self.iqr_multiplier * (q3 - q1);
        if n < 3 || threshold <= f64::EPSILON {
            return Vec::new();
        }

        let half = (self.smoothing_window / 2).max(1);
        let mut corrected: Vec<usize> = Vec::new();

        loop {
            let candidate = (0..n)
                .filter(|i| !corrected.contains(i))
                .filter_map(|i| local_mean(values, i, half).map(|m| (i, (values[i] - m).abs())))
                .max_by(|a, b| a.1.total_cmp(&b.1));

            match candidate {
                Some((i, deviation)) if deviation > threshold => {
                    let replacement = interpolate_neighbours(values, i);
                    tracing::debug!(index = i, original = values[i], replacement, "Outlier corrected");
                    values[i] = replacement;
                    corrected.push(i);
                }
                _ => break,
            }
        }

        corrected.sort_unstable();
        corrected
    }

    /// Centred moving average; the window shrinks at the edges.
    fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let half = self.smoothing_window / 2;
        if half == 0 {
            return values.to_vec();
        }
        let n = values.len();
        (0..n)
            .map(|i| {
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(n - 1);
                let window = &values[lo..=hi];
                window.iter().sum::<f64>() / window.len() as f64
            })
            .collect()
    }
}

/// Linear interpolation across interior gaps; edge gaps hold the nearest observation.
/// Returns the filled values and the indices that were filled.
fn fill_gaps(raw: &[Option<f64>]) -> (Vec<f64>, Vec<usize>) {
    let observed: Vec<(usize, f64)> = raw
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    let mut filled = Vec::with_capacity(raw.len());
    let mut gaps = Vec::new();

    for (i, value) in raw.iter().enumerate() {
        if let Some(v) = value {
            filled.push(*v);
            continue;
        }
        gaps.push(i);

        let prev = observed.iter().rev().find(|(j, _)| *j < i);
        let next = observed.iter().find(|(j, _)| *j > i);
        let v = match (prev, next) {
            (Some(&(pi, pv)), Some(&(ni, nv))) => {
                pv + (nv - pv) * (i - pi) as f64 / (ni - pi) as f64
            }
            (Some(&(_, pv)), None) => pv,
            (None, Some(&(_, nv))) => nv,
            // Callers guarantee at least one observation.
            (None, None) => 0.0,
        };
        filled.push(v);
    }

    (filled, gaps)
}

/// Mean of the neighbours within `half` positions of `i`, excluding `i` itself.
fn local_mean(values: &[f64], i: usize, half: usize) -> Option<f64> {
    let lo = i.saturating_sub(half);
    let hi = (i + half).min(values.len() - 1);
    let neighbours: Vec<f64> = (lo..=hi).filter(|&j| j != i).map(|j| values[j]).collect();
    stats::mean(&neighbours)
}

fn interpolate_neighbours(values: &[f64], i: usize) -> f64 {
    let n = values.len();
    match (i.checked_sub(1), (i + 1 < n).then_some(i + 1)) {
        (Some(p), Some(q)) => (values[p] + values[q]) / 2.0,
        (Some(p), None) => values[p],
        (None, Some(q)) => values[q],
        (None, None) => values[i],
    }
}
