use crate::error::ApiError;
use core_types::IndustryBenchmark;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The response of `GET /v1/industries/{code}/benchmarks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSetResponse {
    pub industry_code: String,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkEntry>,
}

/// One metric's distribution as published by the benchmark service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkEntry {
    pub metric: String,
    pub p25: Decimal,
    pub p50: Decimal,
    pub p75: Decimal,
    pub p90: Decimal,
    pub sample_size: u32,
}

impl BenchmarkEntry {
    pub fn into_benchmark(self, industry_code: &str) -> Result<IndustryBenchmark, ApiError> {
        let convert = |d: Decimal, anchor: &str| {
            d.to_f64()
                .ok_or_else(|| ApiError::InvalidData(format!("{} {anchor} out of range: {d}", self.metric)))
        };
        let benchmark = IndustryBenchmark {
            industry_code: industry_code.to_string(),
            metric: self.metric.clone(),
            p25: convert(self.p25, "p25")?,
            p50: convert(self.p50, "p50")?,
            p75: convert(self.p75, "p75")?,
            p90: convert(self.p90, "p90")?,
            sample_size: self.sample_size,
        };
        benchmark
            .validate()
            .map_err(|e| ApiError::InvalidData(e.to_string()))?;
        Ok(benchmark)
    }
}

/// Body of `POST /v1/summaries`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest<'a> {
    pub insights: &'a [core_types::Insight],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// Error body returned by both services.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_strings_and_numbers() {
        let body = r#"{
            "industryCode": "5412",
            "benchmarks": [
                {"metric": "net_margin", "p25": "0.04", "p50": "0.08", "p75": 0.12, "p90": "0.18", "sampleSize": 250}
            ]
        }"#;
        let parsed: BenchmarkSetResponse = serde_json::from_str(body).unwrap();
        let entry = parsed.benchmarks.into_iter().next().unwrap();
        let benchmark = entry.into_benchmark(&parsed.industry_code).unwrap();
        assert_eq!(benchmark.metric, "net_margin");
        assert!((benchmark.p75 - 0.12).abs() < 1e-12);
        assert_eq!(benchmark.sample_size, 250);
    }

    #[test]
    fn rejects_unordered_anchors() {
        let entry = BenchmarkEntry {
            metric: "current_ratio".to_string(),
            p25: Decimal::new(20, 1),
            p50: Decimal::new(15, 1),
            p75: Decimal::new(25, 1),
            p90: Decimal::new(30, 1),
            sample_size: 10,
        };
        assert!(matches!(entry.into_benchmark("5412"), Err(ApiError::InvalidData(_))));
    }
}
