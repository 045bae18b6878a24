use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Trend,
    Anomaly,
    Opportunity,
    Risk,
    Compliance,
    Optimization,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Trend => "trend",
            InsightType::Anomaly => "anomaly",
            InsightType::Opportunity => "opportunity",
            InsightType::Risk => "risk",
            InsightType::Compliance => "compliance",
            InsightType::Optimization => "optimization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
            Impact::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsightMetadata {
    /// The component that produced the insight (e.g. "forecast", "risk").
    pub source: String,
    /// Human-readable window the insight covers (e.g. "next 6 months").
    pub timeframe: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The structured record consumed by dashboards, report renderers and the
/// narrative summarizer. It carries no engine-internal types: `data` is plain JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: Uuid,
    pub client_id: Uuid,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub impact: Impact,
    pub confidence: f64,
    #[serde(default)]
    pub action_items: Vec<String>,
    pub data: JsonValue,
    pub metadata: InsightMetadata,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    /// Creates an insight with a fresh id and timestamp. Confidence is clamped to `[0, 1]`.
    pub fn new(
        client_id: Uuid,
        insight_type: InsightType,
        title: impl Into<String>,
        description: impl Into<String>,
        impact: Impact,
        confidence: f64,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            id: Uuid::new_v4(),
            client_id,
            insight_type,
            title: title.into(),
            description: description.into(),
            impact,
            confidence,
            action_items: Vec::new(),
            data: JsonValue::Null,
            metadata: InsightMetadata::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_action_items(mut self, items: Vec<String>) -> Self {
        self.action_items = items;
        self
    }

    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = data;
        self
    }

    pub fn with_metadata(mut self, metadata: InsightMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_field_in_snake_case() {
        let insight = Insight::new(
            Uuid::new_v4(),
            InsightType::Opportunity,
            "Margin above peers",
            "Net margin is in the top quartile.",
            Impact::Medium,
            1.7,
        );
        assert_eq!(insight.confidence, 1.0);

        let json = serde_json::to_value(&insight).unwrap();
        assert_eq!(json["type"], "opportunity");
        assert_eq!(json["impact"], "medium");
    }
}
