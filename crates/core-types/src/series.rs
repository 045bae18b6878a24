use crate::enums::Polarity;
use crate::error::CoreError;
use crate::metrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Annotations attached to a single observation by the analytics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointFlag {
    GapFilled,
    OutlierCorrected,
    ClampedToZero,
}

/// A single observation. `value` is `None` when the source had a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<PointFlag>,
}

impl DataPoint {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self {
            timestamp,
            value,
            flags: Vec::new(),
        }
    }

    pub fn has_flag(&self, flag: PointFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// An inclusive time window used when fetching history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// The window ending at `end` and spanning `months` calendar months back.
    pub fn trailing_months(end: DateTime<Utc>, months: u32) -> Self {
        let start = end
            .checked_sub_months(chrono::Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }
}

/// An ordered time series of one metric for one client.
///
/// Constructed through [`MetricSeries::new`], which rejects non-increasing or
/// duplicated timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub client_id: Uuid,
    pub metric: String,
    pub polarity: Polarity,
    /// Amounts such as cash or revenue that can never be negative.
    pub non_negative: bool,
    pub points: Vec<DataPoint>,
}

impl MetricSeries {
    /// Creates a validated series. Polarity and non-negativity come from the metric catalogue.
    pub fn new(
        client_id: Uuid,
        metric: impl Into<String>,
        points: Vec<DataPoint>,
    ) -> Result<Self, CoreError> {
        let metric = metric.into();
        if let Some(pair) = points.windows(2).find(|w| w[1].timestamp <= w[0].timestamp) {
            return Err(CoreError::InvalidInput(
                format!("series '{}'", metric),
                format!(
                    "timestamps must be strictly increasing ({} followed by {})",
                    pair[0].timestamp, pair[1].timestamp
                ),
            ));
        }
        if let Some(bad) = points.iter().find(|p| p.value.is_some_and(|v| !v.is_finite())) {
            return Err(CoreError::InvalidInput(
                format!("series '{}'", metric),
                format!("non-finite value at {}", bad.timestamp),
            ));
        }

        Ok(Self {
            client_id,
            polarity: metrics::polarity_of(&metric),
            non_negative: metrics::is_non_negative(&metric),
            metric,
            points,
        })
    }

    /// Convenience constructor from `(timestamp, value)` pairs.
    pub fn from_pairs(
        client_id: Uuid,
        metric: impl Into<String>,
        pairs: impl IntoIterator<Item = (DateTime<Utc>, Option<f64>)>,
    ) -> Result<Self, CoreError> {
        let points = pairs
            .into_iter()
            .map(|(timestamp, value)| DataPoint::new(timestamp, value))
            .collect();
        Self::new(client_id, metric, points)
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_non_negative(mut self, non_negative: bool) -> Self {
        self.non_negative = non_negative;
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points carrying an actual observation.
    pub fn observed_count(&self) -> usize {
        self.points.iter().filter(|p| p.value.is_some()).count()
    }

    pub fn raw_values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    /// The most recent observed value, skipping trailing gaps.
    pub fn latest_value(&self) -> Option<f64> {
        self.points.iter().rev().find_map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn month(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = MetricSeries::from_pairs(
            Uuid::new_v4(),
            "revenue",
            vec![(month(1), Some(1.0)), (month(1), Some(2.0))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let result = MetricSeries::from_pairs(
            Uuid::new_v4(),
            "revenue",
            vec![(month(3), Some(1.0)), (month(2), Some(2.0))],
        );
        assert!(result.is_err());
    }

    #[test]
    fn picks_up_catalogue_polarity() {
        let series =
            MetricSeries::from_pairs(Uuid::new_v4(), "debt_to_equity", vec![(month(1), Some(1.2))])
                .unwrap();
        assert_eq!(series.polarity, Polarity::LowerIsBetter);

        let cash = MetricSeries::from_pairs(Uuid::new_v4(), "cash_flow", vec![]).unwrap();
        assert_eq!(cash.polarity, Polarity::HigherIsBetter);
    }

    #[test]
    fn latest_value_skips_trailing_gaps() {
        let series = MetricSeries::from_pairs(
            Uuid::new_v4(),
            "revenue",
            vec![(month(1), Some(10.0)), (month(2), Some(12.0)), (month(3), None)],
        )
        .unwrap();
        assert_eq!(series.latest_value(), Some(12.0));
        assert_eq!(series.observed_count(), 2);
    }

    #[test]
    fn trailing_window_spans_calendar_months() {
        let range = TimeRange::trailing_months(month(7), 6);
        assert_eq!(range.start, month(1));
        assert_eq!(range.end, month(7));
    }
}
