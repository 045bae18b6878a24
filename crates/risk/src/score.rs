use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Financial,
    Operational,
    Compliance,
    Behavioral,
    Market,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Financial,
        RiskCategory::Operational,
        RiskCategory::Compliance,
        RiskCategory::Behavioral,
        RiskCategory::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Financial => "financial",
            RiskCategory::Operational => "operational",
            RiskCategory::Compliance => "compliance",
            RiskCategory::Behavioral => "behavioral",
            RiskCategory::Market => "market",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            RiskLevel::VeryHigh
        } else if score >= 0.6 {
            RiskLevel::High
        } else if score >= 0.4 {
            RiskLevel::Medium
        } else if score >= 0.2 {
            RiskLevel::Low
        } else {
            RiskLevel::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the overall score relative to prior assessments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Improving,
    Stable,
    Deteriorating,
    /// No prior scores to compare against.
    Unknown,
}

impl RiskTrend {
    /// Compares `current` with `reference`; a rising risk score is deteriorating.
    pub fn between(current: f64, reference: f64, band: f64) -> Self {
        let delta = current - reference;
        if delta > band {
            RiskTrend::Deteriorating
        } else if delta < -band {
            RiskTrend::Improving
        } else {
            RiskTrend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTrend::Improving => "improving",
            RiskTrend::Stable => "stable",
            RiskTrend::Deteriorating => "deteriorating",
            RiskTrend::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RiskTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponent {
    pub name: String,
    pub raw_value: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: RiskCategory,
    pub score: f64,
    pub weight: f64,
    pub components: Vec<RiskComponent>,
    /// No component data was available; `score` is the neutral default.
    pub defaulted: bool,
}

impl RiskFactor {
    pub fn contribution(&self) -> f64 {
        self.score * self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarning {
    pub name: String,
    pub current_value: f64,
    /// The threshold crossed, or the warning threshold when the status is normal.
    pub threshold: f64,
    pub status: WarningStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub client_id: Uuid,
    pub overall_score: f64,
    pub level: RiskLevel,
    pub short_term_trend: RiskTrend,
    pub long_term_trend: RiskTrend,
    pub factors: Vec<RiskFactor>,
    pub early_warnings: Vec<EarlyWarning>,
    pub defaulted_categories: Vec<RiskCategory>,
    pub notes: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

impl RiskScore {
    pub fn factor(&self, category: RiskCategory) -> Option<&RiskFactor> {
        self.factors.iter().find(|f| f.category == category)
    }

    /// Early warnings that are not `Normal`, most severe first.
    pub fn active_warnings(&self) -> Vec<&EarlyWarning> {
        let mut active: Vec<_> = self
            .early_warnings
            .iter()
            .filter(|w| w.status != WarningStatus::Normal)
            .collect();
        active.sort_by(|a, b| b.status.cmp(&a.status));
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds_are_inclusive() {
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_score(0.605), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.19), RiskLevel::VeryLow);
    }

    #[test]
    fn trend_band() {
        assert_eq!(RiskTrend::between(0.50, 0.47, 0.05), RiskTrend::Stable);
        assert_eq!(RiskTrend::between(0.60, 0.50, 0.05), RiskTrend::Deteriorating);
        assert_eq!(RiskTrend::between(0.40, 0.50, 0.05), RiskTrend::Improving);
    }

    #[test]
    fn trend_renders_snake_case() {
        assert_eq!(RiskTrend::Deteriorating.to_string(), "deteriorating");
        assert_eq!(RiskTrend::Unknown.as_str(), "unknown");
    }
}
