use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// A reference distribution for one metric, expressed as percentile anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryBenchmark {
    /// Industry code, or a synthetic `peer:<client>` code for peer-derived distributions.
    pub industry_code: String,
    pub metric: String,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub sample_size: u32,
}

impl IndustryBenchmark {
    /// Checks that the anchors are finite and ordered `p25 <= p50 <= p75 <= p90`.
    pub fn validate(&self) -> Result<(), CoreError> {
        let anchors = [self.p25, self.p50, self.p75, self.p90];
        if anchors.iter().any(|a| !a.is_finite()) {
            return Err(CoreError::InvalidInput(
                format!("benchmark '{}'", self.metric),
                "percentile anchors must be finite".to_string(),
            ));
        }
        if anchors.windows(2).any(|w| w[0] > w[1]) {
            return Err(CoreError::InvalidInput(
                format!("benchmark '{}'", self.metric),
                format!(
                    "percentile anchors out of order: p25={} p50={} p75={} p90={}",
                    self.p25, self.p50, self.p75, self.p90
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn benchmark(p25: f64, p50: f64, p75: f64, p90: f64) -> IndustryBenchmark {
        IndustryBenchmark {
            industry_code: "5412".to_string(),
            metric: "profit_margin".to_string(),
            p25,
            p50,
            p75,
            p90,
            sample_size: 120,
        }
    }

    #[test]
    fn accepts_ordered_anchors() {
        assert!(benchmark(0.02, 0.05, 0.09, 0.14).validate().is_ok());
        assert!(benchmark(0.05, 0.05, 0.05, 0.05).validate().is_ok());
    }

    #[test]
    fn rejects_unordered_or_non_finite_anchors() {
        assert!(benchmark(0.05, 0.02, 0.09, 0.14).validate().is_err());
        assert!(benchmark(0.02, f64::NAN, 0.09, 0.14).validate().is_err());
    }
}
