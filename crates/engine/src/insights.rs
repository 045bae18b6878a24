//! Normalisation of component outputs into `Insight` records.

use crate::report::{MetricAnalysis, PeerBenchmark};
use benchmark::{CompetitivePosition, PortfolioComparison};
use core_types::{metrics, Impact, Insight, InsightMetadata, InsightType, Polarity};
use risk::{RiskCategory, RiskLevel, RiskScore, WarningStatus};
use serde_json::json;
use uuid::Uuid;

/// Projected change beyond which a forecast is worth a medium-impact insight.
const NOTABLE_CHANGE: f64 = 0.10;
/// Projected change beyond which a forecast is high impact.
const MAJOR_CHANGE: f64 = 0.25;
/// Compliance factor score from which a dedicated compliance insight is raised.
const COMPLIANCE_ALERT_SCORE: f64 = 0.6;

fn metadata(source: &str, timeframe: String, category: &str, tags: Vec<String>) -> InsightMetadata {
    InsightMetadata {
        source: source.to_string(),
        timeframe,
        category: category.to_string(),
        tags,
    }
}

/// One insight per forecast metric. Favourable moves of at least 10% become
/// opportunities; everything else is a trend.
pub fn forecast_insight(client_id: Uuid, analysis: &MetricAnalysis) -> Insight {
    let forecast = &analysis.forecast;
    let change = analysis.projected_change().unwrap_or(0.0);
    let favourable = match forecast.polarity {
        Polarity::HigherIsBetter => change >= 0.0,
        Polarity::LowerIsBetter => change <= 0.0,
    };
    let magnitude = change.abs();

    let impact = if magnitude >= MAJOR_CHANGE {
        Impact::High
    } else if magnitude >= NOTABLE_CHANGE {
        Impact::Medium
    } else {
        Impact::Low
    };
    let insight_type = if favourable && magnitude >= NOTABLE_CHANGE {
        InsightType::Opportunity
    } else {
        InsightType::Trend
    };
    let direction = if magnitude < 0.01 {
        "flat"
    } else if change > 0.0 {
        "rising"
    } else {
        "falling"
    };

    let title = format!(
        "{} {} over the next {} periods",
        metrics::display_name(&analysis.metric),
        direction,
        forecast.horizon
    );
    let description = format!(
        "The {} model projects {} to move {:+.1}% from {:.2} by the end of the horizon (accuracy {:.2}).",
        forecast.model,
        analysis.metric,
        change * 100.0,
        analysis.last_observed,
        forecast.accuracy
    );

    let mut action_items = Vec::new();
    if !favourable && magnitude >= NOTABLE_CHANGE {
        action_items.push(format!("Review the drivers behind the projected {} decline", analysis.metric));
    }
    if forecast.degraded {
        action_items.push("Some forecasting models failed; verify the input history".to_string());
    }
    if analysis.gap_filled > 0 || analysis.outliers_corrected > 0 {
        action_items.push(format!(
            "Check source data: {} gaps filled, {} outliers corrected",
            analysis.gap_filled, analysis.outliers_corrected
        ));
    }

    let mut tags = vec![forecast.model.to_string()];
    if forecast.decomposition.is_some() {
        tags.push("seasonal".to_string());
    }
    if forecast.degraded {
        tags.push("degraded".to_string());
    }

    let data = json!({
        "metric": analysis.metric,
        "model": forecast.model,
        "horizon": forecast.horizon,
        "accuracy": forecast.accuracy,
        "projected_change": change,
        "last_observed": analysis.last_observed,
        "points": forecast.points,
        "scenarios": analysis.scenarios,
        "notes": forecast.notes,
    });

    Insight::new(client_id, insight_type, title, description, impact, forecast.mean_confidence())
        .with_action_items(action_items)
        .with_data(data)
        .with_metadata(metadata(
            "forecast",
            format!("next {} periods", forecast.horizon),
            &analysis.metric,
            tags,
        ))
}

/// Raised when the preprocessor had to correct outliers.
pub fn anomaly_insight(client_id: Uuid, analysis: &MetricAnalysis) -> Option<Insight> {
    if analysis.outliers_corrected == 0 {
        return None;
    }
    let impact = if analysis.outliers_corrected > 2 { Impact::Medium } else { Impact::Low };
    Some(
        Insight::new(
            client_id,
            InsightType::Anomaly,
            format!("Unusual {} values detected", metrics::display_name(&analysis.metric).to_lowercase()),
            format!(
                "{} observation(s) of {} deviated sharply from their neighbours and were replaced before forecasting.",
                analysis.outliers_corrected, analysis.metric
            ),
            impact,
            0.7,
        )
        .with_action_items(vec![format!("Confirm the flagged {} entries with the client", analysis.metric)])
        .with_data(json!({
            "metric": analysis.metric,
            "outliers_corrected": analysis.outliers_corrected,
            "gap_filled": analysis.gap_filled,
        }))
        .with_metadata(metadata("preprocessing", "history".to_string(), &analysis.metric, vec!["data_quality".to_string()])),
    )
}

fn risk_impact(level: RiskLevel) -> Impact {
    match level {
        RiskLevel::VeryHigh => Impact::Critical,
        RiskLevel::High => Impact::High,
        RiskLevel::Medium => Impact::Medium,
        RiskLevel::Low | RiskLevel::VeryLow => Impact::Low,
    }
}

/// The overall risk insight, plus a compliance insight when that factor is elevated.
///
/// Confidence is the share of category weight backed by real data. The risk payload
/// carries `overall_score` at the top level; the persisted history is read from it.
pub fn risk_insights(score: &RiskScore) -> Vec<Insight> {
    let confidence: f64 = score
        .factors
        .iter()
        .filter(|f| !f.defaulted)
        .map(|f| f.weight)
        .sum();

    let action_items = score
        .active_warnings()
        .iter()
        .map(|w| {
            let severity = if w.status == WarningStatus::Critical { "critical" } else { "warning" };
            format!(
                "Address {} ({:.2}, {} threshold {:.2})",
                w.name, w.current_value, severity, w.threshold
            )
        })
        .collect();

    let mut tags = vec![score.level.as_str().to_string()];
    tags.extend(score.defaulted_categories.iter().map(|c| format!("defaulted:{c}")));

    let mut insights = vec![Insight::new(
        score.client_id,
        InsightType::Risk,
        format!("Overall risk is {}", score.level.as_str().replace('_', " ")),
        format!(
            "Weighted risk score {:.2} across {} categories; short-term trend {}, long-term trend {}.",
            score.overall_score,
            score.factors.len(),
            score.short_term_trend,
            score.long_term_trend
        ),
        risk_impact(score.level),
        confidence,
    )
    .with_action_items(action_items)
    .with_data(serde_json::to_value(score).unwrap_or_default())
    .with_metadata(metadata("risk", "current".to_string(), "overall", tags))];

    if let Some(compliance) = score
        .factor(RiskCategory::Compliance)
        .filter(|f| !f.defaulted && f.score >= COMPLIANCE_ALERT_SCORE)
    {
        let findings = compliance
            .components
            .iter()
            .filter(|c| c.impact >= COMPLIANCE_ALERT_SCORE)
            .map(|c| format!("Resolve {} ({:.2})", c.name, c.raw_value))
            .collect();
        insights.push(
            Insight::new(
                score.client_id,
                InsightType::Compliance,
                "Compliance risk is elevated",
                format!("The compliance factor scores {:.2}.", compliance.score),
                if compliance.score >= 0.8 { Impact::High } else { Impact::Medium },
                0.8,
            )
            .with_action_items(findings)
            .with_data(json!({ "factor": compliance }))
            .with_metadata(metadata("risk", "current".to_string(), "compliance", Vec::new())),
        );
    }
    insights
}

fn position_impact(position: CompetitivePosition) -> Impact {
    match position {
        CompetitivePosition::Laggard => Impact::High,
        CompetitivePosition::BelowAverage => Impact::Medium,
        _ => Impact::Low,
    }
}

/// A benchmark insight against the industry (`source` "industry_benchmark") or a peer group.
pub fn benchmark_insight(client_id: Uuid, comparison: &PortfolioComparison, source: &str) -> Insight {
    let insight_type = if comparison.weaknesses.is_empty() {
        InsightType::Opportunity
    } else {
        InsightType::Optimization
    };
    let covered = comparison.comparisons.len() as f64;
    let confidence = covered / (covered + comparison.unbenchmarked.len() as f64);

    let action_items = comparison
        .comparisons
        .iter()
        .filter(|c| comparison.weaknesses.contains(&c.metric))
        .map(|c| {
            format!(
                "Improve {} (rank P{}, {:+.2} vs median)",
                c.metric, c.percentile_rank, c.variance_from_median
            )
        })
        .collect();

    let ranks: Vec<_> = comparison
        .comparisons
        .iter()
        .map(|c| {
            json!({
                "metric": c.metric,
                "client_value": c.client_value,
                "median": c.benchmark.p50,
                "percentile_rank": c.percentile_rank,
                "tier": c.tier,
            })
        })
        .collect();

    Insight::new(
        client_id,
        insight_type,
        format!("Competitive position: {}", comparison.position.as_str().replace('_', " ")),
        format!(
            "Weighted benchmark score {:.1} over {} metrics; strengths: {}; weaknesses: {}.",
            comparison.overall_score,
            comparison.comparisons.len(),
            list_or_none(&comparison.strengths),
            list_or_none(&comparison.weaknesses)
        ),
        position_impact(comparison.position),
        confidence,
    )
    .with_action_items(action_items)
    .with_data(json!({
        "overall_score": comparison.overall_score,
        "position": comparison.position,
        "comparisons": ranks,
        "strengths": comparison.strengths,
        "weaknesses": comparison.weaknesses,
        "unbenchmarked": comparison.unbenchmarked,
    }))
    .with_metadata(metadata(source, "latest period".to_string(), "benchmark", Vec::new()))
}

/// The peer benchmark insight, with the cohort and its relaxation path in the payload.
pub fn peer_insight(client_id: Uuid, peer: &PeerBenchmark) -> Insight {
    let mut insight = benchmark_insight(client_id, &peer.comparison, "peer_group");
    if let Some(data) = insight.data.as_object_mut() {
        data.insert("peer_count".to_string(), json!(peer.peer_group.len()));
        data.insert("relaxation_path".to_string(), json!(peer.peer_group.relaxation_path));
    }
    if peer.peer_group.was_relaxed() {
        insight.metadata.tags.push("relaxed_cohort".to_string());
    }
    insight
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk::{RiskScoringEngine, RiskSnapshot};

    #[test]
    fn risk_insight_carries_overall_score() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.financial.current_ratio = Some(0.9);
        snapshot.financial.profit_margin = Some(0.02);
        snapshot.financial.debt_to_equity = Some(3.0);
        let score = RiskScoringEngine::new().score(&snapshot, &[]).unwrap();

        let insights = risk_insights(&score);
        assert_eq!(insights.len(), 1);
        let risk = &insights[0];
        assert_eq!(risk.insight_type, InsightType::Risk);
        assert_eq!(risk.impact, Impact::High);
        assert!((risk.confidence - 0.35).abs() < 1e-9);
        assert!((risk.data["overall_score"].as_f64().unwrap() - 0.605).abs() < 1e-9);
        assert!(!risk.action_items.is_empty());
        assert!(risk.description.contains("short-term trend unknown"));
    }

    #[test]
    fn elevated_compliance_gets_its_own_insight() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.compliance.late_filings = Some(4.0);
        snapshot.compliance.open_audit_findings = Some(3.0);
        let score = RiskScoringEngine::new().score(&snapshot, &[]).unwrap();

        let insights = risk_insights(&score);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[1].insight_type, InsightType::Compliance);
        assert_eq!(insights[1].action_items.len(), 2);
    }
}
