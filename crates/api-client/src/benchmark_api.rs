use crate::error::ApiError;
use crate::http::{build_client, decode, endpoint};
use crate::responses::BenchmarkSetResponse;
use async_trait::async_trait;
use configuration::HttpProviderSettings;
use core_types::{BenchmarkProvider, CollaboratorError, IndustryBenchmark};

/// Client of the industry benchmark service.
#[derive(Debug, Clone)]
pub struct BenchmarkApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl BenchmarkApiClient {
    pub fn new(settings: &HttpProviderSettings) -> Result<Self, ApiError> {
        if settings.base_url.trim().is_empty() {
            return Err(ApiError::Configuration("benchmark API base_url is empty".to_string()));
        }
        Ok(Self {
            client: build_client(settings)?,
            base_url: settings.base_url.clone(),
        })
    }

    /// Fetches the published distributions of `metrics` for one industry.
    ///
    /// Entries whose anchors are unusable are dropped with a warning; the caller
    /// treats the affected metrics as unbenchmarked.
    pub async fn fetch_benchmarks(
        &self,
        industry_code: &str,
        metrics: &[String],
    ) -> Result<Vec<IndustryBenchmark>, ApiError> {
        let url = endpoint(&self.base_url, &format!("industries/{industry_code}/benchmarks"));
        let response = self
            .client
            .get(&url)
            .query(&[("metrics", metrics.join(","))])
            .send()
            .await?;
        let body: BenchmarkSetResponse = decode(response).await?;

        let mut benchmarks = Vec::with_capacity(body.benchmarks.len());
        for entry in body.benchmarks {
            if !metrics.is_empty() && !metrics.contains(&entry.metric) {
                continue;
            }
            let metric = entry.metric.clone();
            match entry.into_benchmark(&body.industry_code) {
                Ok(b) => benchmarks.push(b),
                Err(e) => tracing::warn!(industry_code, metric = %metric, error = %e, "Discarding benchmark entry"),
            }
        }
        tracing::debug!(industry_code, count = benchmarks.len(), "Fetched industry benchmarks");
        Ok(benchmarks)
    }
}

#[async_trait]
impl BenchmarkProvider for BenchmarkApiClient {
    async fn fetch_industry_distribution(
        &self,
        industry_code: &str,
        metric_names: &[String],
    ) -> Result<Vec<IndustryBenchmark>, CollaboratorError> {
        Ok(self.fetch_benchmarks(industry_code, metric_names).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_base_url_is_rejected() {
        let settings = HttpProviderSettings {
            base_url: "  ".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(BenchmarkApiClient::new(&settings), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        let settings = HttpProviderSettings {
            base_url: "https://bench.example/v1".to_string(),
            api_key: "bad\nkey".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(BenchmarkApiClient::new(&settings), Err(ApiError::Configuration(_))));
    }
}
