use crate::error::RiskError;
use crate::factors::compute_factor;
use crate::score::{RiskCategory, RiskFactor, RiskLevel, RiskScore, RiskTrend};
use crate::snapshot::RiskSnapshot;
use crate::warnings::early_warnings;
use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Score change within which a trend is reported as stable.
pub const TREND_BAND: f64 = 0.05;
/// Number of prior scores averaged for the long-term trend.
pub const LONG_TERM_WINDOW: usize = 6;

/// Fixed weight of each category in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub financial: f64,
    pub operational: f64,
    pub compliance: f64,
    pub behavioral: f64,
    pub market: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            financial: 0.35,
            operational: 0.25,
            compliance: 0.20,
            behavioral: 0.15,
            market: 0.05,
        }
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: RiskCategory) -> f64 {
        match category {
            RiskCategory::Financial => self.financial,
            RiskCategory::Operational => self.operational,
            RiskCategory::Compliance => self.compliance,
            RiskCategory::Behavioral => self.behavioral,
            RiskCategory::Market => self.market,
        }
    }

    /// Weights must be non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), RiskError> {
        let weights = RiskCategory::ALL.map(|c| self.weight(c));
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(RiskError::InvalidParameters(
                "category weights must be finite and non-negative".to_string(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(RiskError::InvalidParameters(format!(
                "category weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Computes the multi-category risk score of a client.
#[derive(Debug, Clone, Default)]
pub struct RiskScoringEngine {
    weights: CategoryWeights,
}

impl RiskScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: CategoryWeights) -> Result<Self, RiskError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Scores `snapshot`. `prior_scores` are earlier overall scores, oldest first,
    /// and only drive the trend tags.
    ///
    /// A score is always produced: invalid inputs are discarded and noted, and
    /// categories left without data fall back to a neutral score and are listed in
    /// `defaulted_categories`.
    pub fn score(&self, snapshot: &RiskSnapshot, prior_scores: &[f64]) -> Result<RiskScore, RiskError> {
        let (snapshot, rejected) = snapshot.sanitized();
        let snapshot = &snapshot;
        for err in &rejected {
            tracing::warn!(client_id = %snapshot.client_id, error = %err, "Discarding risk input");
        }

        let factors: Vec<RiskFactor> = RiskCategory::ALL
            .par_iter()
            .map(|&category| compute_factor(category, self.weights.weight(category), snapshot))
            .collect();

        let overall_score = factors
            .iter()
            .map(RiskFactor::contribution)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        if !overall_score.is_finite() {
            return Err(RiskError::Calculation("overall risk score is not finite".to_string()));
        }

        let defaulted_categories: Vec<RiskCategory> = factors
            .iter()
            .filter(|f| f.defaulted)
            .map(|f| f.category)
            .collect();
        let mut notes: Vec<String> = rejected.iter().map(|e| format!("{e}; value ignored")).collect();
        notes.extend(
            defaulted_categories
                .iter()
                .map(|c| format!("no {c} data available; neutral score applied")),
        );

        let (short_term_trend, long_term_trend) = trends(overall_score, prior_scores);
        if prior_scores.is_empty() {
            notes.push("no prior risk scores; trend unknown".to_string());
        }

        let level = RiskLevel::from_score(overall_score);
        tracing::debug!(
            client_id = %snapshot.client_id,
            overall_score,
            level = %level,
            defaulted = defaulted_categories.len(),
            "Risk score computed"
        );

        Ok(RiskScore {
            client_id: snapshot.client_id,
            overall_score,
            level,
            short_term_trend,
            long_term_trend,
            factors,
            early_warnings: early_warnings(snapshot),
            defaulted_categories,
            notes,
            computed_at: Utc::now(),
        })
    }
}

fn trends(current: f64, prior: &[f64]) -> (RiskTrend, RiskTrend) {
    let Some(&latest) = prior.last() else {
        return (RiskTrend::Unknown, RiskTrend::Unknown);
    };
    let window = &prior[prior.len().saturating_sub(LONG_TERM_WINDOW)..];
    let long_reference = window.iter().sum::<f64>() / window.len() as f64;
    (
        RiskTrend::between(current, latest, TREND_BAND),
        RiskTrend::between(current, long_reference, TREND_BAND),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::WarningStatus;
    use uuid::Uuid;

    fn distressed() -> RiskSnapshot {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.financial.current_ratio = Some(0.9);
        snapshot.financial.profit_margin = Some(0.02);
        snapshot.financial.debt_to_equity = Some(3.0);
        snapshot
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!(CategoryWeights::default().validate().is_ok());
        let skewed = CategoryWeights {
            market: 0.10,
            ..CategoryWeights::default()
        };
        assert!(RiskScoringEngine::with_weights(skewed).is_err());
    }

    #[test]
    fn distressed_financials_score_high() {
        let score = RiskScoringEngine::new().score(&distressed(), &[]).unwrap();

        let financial = score.factor(RiskCategory::Financial).unwrap();
        assert!(financial.score >= 0.7);
        assert!(matches!(score.level, RiskLevel::High | RiskLevel::VeryHigh));
        assert!((score.overall_score - 0.605).abs() < 1e-9);
        assert_eq!(score.defaulted_categories.len(), 4);
        assert_eq!(score.short_term_trend, RiskTrend::Unknown);
        assert_eq!(score.active_warnings()[0].status, WarningStatus::Critical);
    }

    #[test]
    fn overall_is_weighted_sum_and_bounded() {
        let mut snapshot = distressed();
        snapshot.operational.revenue_growth = Some(0.2);
        snapshot.compliance.late_filings = Some(0.0);
        snapshot.behavioral.engagement_score = Some(0.9);
        snapshot.market.market_volatility = Some(0.5);

        let score = RiskScoringEngine::new().score(&snapshot, &[]).unwrap();
        let expected: f64 = score.factors.iter().map(|f| f.score * f.weight).sum();
        assert!((score.overall_score - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&score.overall_score));
        assert!(score.defaulted_categories.is_empty());
    }

    #[test]
    fn empty_snapshot_still_scores() {
        let score = RiskScoringEngine::new()
            .score(&RiskSnapshot::new(Uuid::new_v4()), &[])
            .unwrap();
        assert!((score.overall_score - 0.5).abs() < 1e-12);
        assert_eq!(score.level, RiskLevel::Medium);
        assert_eq!(score.defaulted_categories.len(), 5);
    }

    #[test]
    fn trends_compare_against_history() {
        let score = RiskScoringEngine::new()
            .score(&distressed(), &[0.30, 0.35, 0.40, 0.59])
            .unwrap();
        assert_eq!(score.short_term_trend, RiskTrend::Stable);
        assert_eq!(score.long_term_trend, RiskTrend::Deteriorating);
    }

    #[test]
    fn invalid_inputs_are_ignored_not_fatal() {
        let mut snapshot = distressed();
        snapshot.behavioral.engagement_score = Some(75.0);
        let score = RiskScoringEngine::new().score(&snapshot, &[]).unwrap();

        // Same result as if the engagement score had never been supplied.
        assert!((score.overall_score - 0.605).abs() < 1e-9);
        assert!(score.defaulted_categories.contains(&RiskCategory::Behavioral));
        assert!(score.notes.iter().any(|n| n.contains("engagement_score")));
    }

    #[test]
    fn invalid_value_beside_valid_ones_keeps_the_category() {
        let mut snapshot = distressed();
        snapshot.financial.current_ratio = Some(f64::NAN);
        let score = RiskScoringEngine::new().score(&snapshot, &[]).unwrap();

        let financial = score.factor(RiskCategory::Financial).unwrap();
        assert!(!financial.defaulted);
        assert!(financial.components.iter().all(|c| c.name != "current_ratio"));
        assert!(score.overall_score.is_finite());
    }
}
