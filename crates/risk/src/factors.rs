use crate::score::{RiskCategory, RiskComponent, RiskFactor};
use crate::snapshot::RiskSnapshot;

pub const HIGH_IMPACT: f64 = 0.8;
pub const MODERATE_IMPACT: f64 = 0.4;
pub const LOW_IMPACT: f64 = 0.2;

/// Score of a category for which no component data exists.
pub const DEFAULT_FACTOR_SCORE: f64 = 0.5;

/// Which side of the breakpoints is risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Risky {
    Below,
    Above,
}

/// Maps a raw value onto the three impact levels.
///
/// For `Risky::Below`, values under `high` are high impact and values over `low`
/// are low impact. `Risky::Above` mirrors that. Anything in between is moderate.
#[derive(Debug, Clone, Copy)]
pub struct Breakpoints {
    risky: Risky,
    high: f64,
    low: f64,
}

impl Breakpoints {
    const fn below(high: f64, low: f64) -> Self {
        Self { risky: Risky::Below, high, low }
    }

    const fn above(high: f64, low: f64) -> Self {
        Self { risky: Risky::Above, high, low }
    }

    pub fn impact(&self, value: f64) -> f64 {
        match self.risky {
            Risky::Below if value < self.high => HIGH_IMPACT,
            Risky::Below if value > self.low => LOW_IMPACT,
            Risky::Above if value > self.high => HIGH_IMPACT,
            Risky::Above if value < self.low => LOW_IMPACT,
            _ => MODERATE_IMPACT,
        }
    }
}

pub const CURRENT_RATIO: Breakpoints = Breakpoints::below(1.5, 2.5);
pub const PROFIT_MARGIN: Breakpoints = Breakpoints::below(0.05, 0.15);
pub const DEBT_TO_EQUITY: Breakpoints = Breakpoints::above(2.0, 1.0);
pub const CASH_FLOW_VOLATILITY: Breakpoints = Breakpoints::above(0.5, 0.2);

pub const REVENUE_GROWTH: Breakpoints = Breakpoints::below(0.0, 0.10);
pub const CUSTOMER_CONCENTRATION: Breakpoints = Breakpoints::above(0.5, 0.2);
pub const DAYS_SALES_OUTSTANDING: Breakpoints = Breakpoints::above(60.0, 30.0);

// Counts: three or more is high, none is low.
pub const LATE_FILINGS: Breakpoints = Breakpoints::above(2.0, 0.5);
pub const OPEN_AUDIT_FINDINGS: Breakpoints = Breakpoints::above(2.0, 0.5);
pub const DOCUMENTATION_COMPLETENESS: Breakpoints = Breakpoints::below(0.7, 0.9);

pub const PAYMENT_DELAY_DAYS: Breakpoints = Breakpoints::above(30.0, 10.0);
pub const ENGAGEMENT_SCORE: Breakpoints = Breakpoints::below(0.4, 0.7);
pub const RESPONSE_TIME_DAYS: Breakpoints = Breakpoints::above(7.0, 2.0);

pub const INDUSTRY_GROWTH: Breakpoints = Breakpoints::below(0.0, 0.05);
pub const MARKET_VOLATILITY: Breakpoints = Breakpoints::above(0.3, 0.15);

/// The `(name, value, breakpoints)` triples of one category.
fn inputs(category: RiskCategory, s: &RiskSnapshot) -> Vec<(&'static str, Option<f64>, Breakpoints)> {
    match category {
        RiskCategory::Financial => vec![
            ("current_ratio", s.financial.current_ratio, CURRENT_RATIO),
            ("profit_margin", s.financial.profit_margin, PROFIT_MARGIN),
            ("debt_to_equity", s.financial.debt_to_equity, DEBT_TO_EQUITY),
            ("cash_flow_volatility", s.financial.cash_flow_volatility, CASH_FLOW_VOLATILITY),
        ],
        RiskCategory::Operational => vec![
            ("revenue_growth", s.operational.revenue_growth, REVENUE_GROWTH),
            ("customer_concentration", s.operational.customer_concentration, CUSTOMER_CONCENTRATION),
            ("days_sales_outstanding", s.operational.days_sales_outstanding, DAYS_SALES_OUTSTANDING),
        ],
        RiskCategory::Compliance => vec![
            ("late_filings", s.compliance.late_filings, LATE_FILINGS),
            ("open_audit_findings", s.compliance.open_audit_findings, OPEN_AUDIT_FINDINGS),
            ("documentation_completeness", s.compliance.documentation_completeness, DOCUMENTATION_COMPLETENESS),
        ],
        RiskCategory::Behavioral => vec![
            ("payment_delay_days", s.behavioral.payment_delay_days, PAYMENT_DELAY_DAYS),
            ("engagement_score", s.behavioral.engagement_score, ENGAGEMENT_SCORE),
            ("response_time_days", s.behavioral.response_time_days, RESPONSE_TIME_DAYS),
        ],
        RiskCategory::Market => vec![
            ("industry_growth", s.market.industry_growth, INDUSTRY_GROWTH),
            ("market_volatility", s.market.market_volatility, MARKET_VOLATILITY),
        ],
    }
}

/// Scores one category as the mean impact of the components present.
pub fn compute_factor(category: RiskCategory, weight: f64, snapshot: &RiskSnapshot) -> RiskFactor {
    let components: Vec<RiskComponent> = inputs(category, snapshot)
        .into_iter()
        .filter_map(|(name, value, breakpoints)| {
            value.map(|raw_value| RiskComponent {
                name: name.to_string(),
                raw_value,
                impact: breakpoints.impact(raw_value),
            })
        })
        .collect();

    let defaulted = components.is_empty();
    let score = if defaulted {
        DEFAULT_FACTOR_SCORE
    } else {
        components.iter().map(|c| c.impact).sum::<f64>() / components.len() as f64
    };

    RiskFactor {
        category,
        score,
        weight,
        components,
        defaulted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn current_ratio_breakpoints() {
        assert_eq!(CURRENT_RATIO.impact(0.9), HIGH_IMPACT);
        assert_eq!(CURRENT_RATIO.impact(1.5), MODERATE_IMPACT);
        assert_eq!(CURRENT_RATIO.impact(2.5), MODERATE_IMPACT);
        assert_eq!(CURRENT_RATIO.impact(3.0), LOW_IMPACT);
    }

    #[test]
    fn count_breakpoints() {
        assert_eq!(LATE_FILINGS.impact(0.0), LOW_IMPACT);
        assert_eq!(LATE_FILINGS.impact(2.0), MODERATE_IMPACT);
        assert_eq!(LATE_FILINGS.impact(3.0), HIGH_IMPACT);
    }

    #[test]
    fn factor_is_mean_of_present_components() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.operational.revenue_growth = Some(-0.05);
        snapshot.operational.days_sales_outstanding = Some(20.0);

        let factor = compute_factor(RiskCategory::Operational, 0.25, &snapshot);
        assert_eq!(factor.components.len(), 2);
        assert!((factor.score - 0.5).abs() < 1e-12);
        assert!(!factor.defaulted);
    }

    #[test]
    fn empty_category_defaults() {
        let snapshot = RiskSnapshot::new(Uuid::new_v4());
        let factor = compute_factor(RiskCategory::Market, 0.05, &snapshot);
        assert!(factor.defaulted);
        assert_eq!(factor.score, DEFAULT_FACTOR_SCORE);
    }
}
