use crate::error::ApiError;
use async_trait::async_trait;
use core_types::{BenchmarkProvider, CollaboratorError, IndustryBenchmark};
use std::path::{Path, PathBuf};

/// Serves benchmark distributions from a JSON file holding a list of
/// `IndustryBenchmark` records. The file is re-read on every request so edits
/// are picked up without a restart.
#[derive(Debug, Clone)]
pub struct FileBenchmarkProvider {
    path: PathBuf,
}

impl FileBenchmarkProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<IndustryBenchmark>, ApiError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        serde_json::from_str(&raw).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    pub async fn benchmarks_for(
        &self,
        industry_code: &str,
        metrics: &[String],
    ) -> Result<Vec<IndustryBenchmark>, ApiError> {
        let all = self.load().await?;
        Ok(all
            .into_iter()
            .filter(|b| b.industry_code == industry_code)
            .filter(|b| metrics.is_empty() || metrics.contains(&b.metric))
            .filter(|b| match b.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), metric = %b.metric, error = %e, "Discarding benchmark entry");
                    false
                }
            })
            .collect())
    }
}

#[async_trait]
impl BenchmarkProvider for FileBenchmarkProvider {
    async fn fetch_industry_distribution(
        &self,
        industry_code: &str,
        metric_names: &[String],
    ) -> Result<Vec<IndustryBenchmark>, CollaboratorError> {
        Ok(self.benchmarks_for(industry_code, metric_names).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("benchmarks-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    const FIXTURE: &str = r#"[
        {"industry_code": "5412", "metric": "net_margin", "p25": 0.04, "p50": 0.08, "p75": 0.12, "p90": 0.18, "sample_size": 250},
        {"industry_code": "5412", "metric": "current_ratio", "p25": 1.0, "p50": 1.5, "p75": 2.0, "p90": 2.5, "sample_size": 250},
        {"industry_code": "5412", "metric": "debt_to_equity", "p25": 2.0, "p50": 1.0, "p75": 3.0, "p90": 4.0, "sample_size": 90},
        {"industry_code": "4451", "metric": "net_margin", "p25": 0.01, "p50": 0.02, "p75": 0.03, "p90": 0.05, "sample_size": 40}
    ]"#;

    #[tokio::test]
    async fn filters_by_industry_and_metric() {
        let provider = FileBenchmarkProvider::new(write_fixture(FIXTURE));
        let benchmarks = provider
            .fetch_industry_distribution("5412", &["net_margin".to_string()])
            .await
            .unwrap();
        assert_eq!(benchmarks.len(), 1);
        assert_eq!(benchmarks[0].p50, 0.08);
        let _ = std::fs::remove_file(provider.path());
    }

    #[tokio::test]
    async fn invalid_distributions_are_dropped() {
        let provider = FileBenchmarkProvider::new(write_fixture(FIXTURE));
        let benchmarks = provider.benchmarks_for("5412", &[]).await.unwrap();
        let metrics: Vec<&str> = benchmarks.iter().map(|b| b.metric.as_str()).collect();
        assert_eq!(metrics, vec!["net_margin", "current_ratio"]);
        let _ = std::fs::remove_file(provider.path());
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let provider = FileBenchmarkProvider::new("/nonexistent/benchmarks.json");
        let err = provider
            .fetch_industry_distribution("5412", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Unavailable(_)));
    }
}
