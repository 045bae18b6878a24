use crate::error::RiskError;
use analytics::stats;
use core_types::{metrics, MetricSeries};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Every metric `RiskSnapshot::from_series` reads, including the ones it derives
/// inputs from.
pub const INPUT_METRICS: &[&str] = &[
    metrics::CURRENT_RATIO,
    metrics::PROFIT_MARGIN,
    metrics::NET_MARGIN,
    metrics::DEBT_TO_EQUITY,
    metrics::CASH_FLOW_VOLATILITY,
    metrics::CASH_FLOW,
    metrics::REVENUE,
    metrics::REVENUE_GROWTH,
    metrics::CUSTOMER_CONCENTRATION,
    metrics::DAYS_SALES_OUTSTANDING,
    metrics::LATE_FILINGS,
    metrics::OPEN_AUDIT_FINDINGS,
    metrics::DOCUMENTATION_COMPLETENESS,
    metrics::PAYMENT_DELAY_DAYS,
    metrics::ENGAGEMENT_SCORE,
    metrics::RESPONSE_TIME_DAYS,
    metrics::INDUSTRY_GROWTH,
    metrics::MARKET_VOLATILITY,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    pub current_ratio: Option<f64>,
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Coefficient of variation of periodic cash flow.
    pub cash_flow_volatility: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationalInputs {
    pub revenue_growth: Option<f64>,
    /// Revenue share of the largest customers, in `[0, 1]`.
    pub customer_concentration: Option<f64>,
    pub days_sales_outstanding: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceInputs {
    pub late_filings: Option<f64>,
    pub open_audit_findings: Option<f64>,
    /// Share of required documents on file, in `[0, 1]`.
    pub documentation_completeness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehavioralInputs {
    pub payment_delay_days: Option<f64>,
    /// Engagement index in `[0, 1]`.
    pub engagement_score: Option<f64>,
    pub response_time_days: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketInputs {
    pub industry_growth: Option<f64>,
    pub market_volatility: Option<f64>,
}

/// Everything the risk engine looks at for one client. Missing values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub client_id: Uuid,
    #[serde(default)]
    pub financial: FinancialInputs,
    #[serde(default)]
    pub operational: OperationalInputs,
    #[serde(default)]
    pub compliance: ComplianceInputs,
    #[serde(default)]
    pub behavioral: BehavioralInputs,
    #[serde(default)]
    pub market: MarketInputs,
}

impl RiskSnapshot {
    pub fn new(client_id: Uuid) -> Self {
        Self {
            client_id,
            financial: FinancialInputs::default(),
            operational: OperationalInputs::default(),
            compliance: ComplianceInputs::default(),
            behavioral: BehavioralInputs::default(),
            market: MarketInputs::default(),
        }
    }

    /// Builds a snapshot from the latest observations of each series.
    ///
    /// Metrics named after a snapshot field are used directly. When absent, a few are
    /// derived: profit margin falls back to net margin, revenue growth is computed
    /// year over year (or over the whole window when shorter) from `revenue`, and
    /// cash-flow volatility is the coefficient of variation of `cash_flow`.
    pub fn from_series(client_id: Uuid, series: &[MetricSeries]) -> Self {
        let by_name: HashMap<&str, &MetricSeries> =
            series.iter().map(|s| (s.metric.as_str(), s)).collect();
        let latest = |name: &str| by_name.get(name).and_then(|s| s.latest_value());
        let observed = |name: &str| -> Vec<f64> {
            by_name
                .get(name)
                .map(|s| s.points.iter().filter_map(|p| p.value).collect())
                .unwrap_or_default()
        };

        let revenue_growth = latest(metrics::REVENUE_GROWTH).or_else(|| {
            let revenue = observed(metrics::REVENUE);
            let last = *revenue.last()?;
            let base = if revenue.len() > 12 {
                revenue[revenue.len() - 13]
            } else {
                *revenue.first()?
            };
            (revenue.len() >= 2 && base.abs() > f64::EPSILON).then(|| (last - base) / base.abs())
        });

        let cash_flow_volatility = latest(metrics::CASH_FLOW_VOLATILITY).or_else(|| {
            let cash_flow = observed(metrics::CASH_FLOW);
            if cash_flow.len() < 3 {
                return None;
            }
            stats::coefficient_of_variation(&cash_flow)
        });

        Self {
            client_id,
            financial: FinancialInputs {
                current_ratio: latest(metrics::CURRENT_RATIO),
                profit_margin: latest(metrics::PROFIT_MARGIN).or_else(|| latest(metrics::NET_MARGIN)),
                debt_to_equity: latest(metrics::DEBT_TO_EQUITY),
                cash_flow_volatility,
            },
            operational: OperationalInputs {
                revenue_growth,
                customer_concentration: latest(metrics::CUSTOMER_CONCENTRATION),
                days_sales_outstanding: latest(metrics::DAYS_SALES_OUTSTANDING),
            },
            compliance: ComplianceInputs {
                late_filings: latest(metrics::LATE_FILINGS),
                open_audit_findings: latest(metrics::OPEN_AUDIT_FINDINGS),
                documentation_completeness: latest(metrics::DOCUMENTATION_COMPLETENESS),
            },
            behavioral: BehavioralInputs {
                payment_delay_days: latest(metrics::PAYMENT_DELAY_DAYS),
                engagement_score: latest(metrics::ENGAGEMENT_SCORE),
                response_time_days: latest(metrics::RESPONSE_TIME_DAYS),
            },
            market: MarketInputs {
                industry_growth: latest(metrics::INDUSTRY_GROWTH),
                market_volatility: latest(metrics::MARKET_VOLATILITY),
            },
        }
    }

    /// Checks every present value: all must be finite, counts and durations
    /// non-negative, and shares within `[0, 1]`. Reports the first violation.
    pub fn validate(&self) -> Result<(), RiskError> {
        let mut copy = self.clone();
        match copy.fields_mut().into_iter().find_map(|(field, rule, value)| rule.check(field, *value)) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns a copy with every invalid value cleared to `None`, together with the
    /// violations that were removed. Categories left empty score as missing data.
    pub fn sanitized(&self) -> (RiskSnapshot, Vec<RiskError>) {
        let mut clean = self.clone();
        let mut rejected = Vec::new();
        for (field, rule, value) in clean.fields_mut() {
            if let Some(err) = rule.check(field, *value) {
                *value = None;
                rejected.push(err);
            }
        }
        (clean, rejected)
    }

    fn fields_mut(&mut self) -> [(&'static str, Rule, &mut Option<f64>); 15] {
        [
            ("current_ratio", Rule::NonNegative, &mut self.financial.current_ratio),
            ("profit_margin", Rule::Finite, &mut self.financial.profit_margin),
            ("debt_to_equity", Rule::Finite, &mut self.financial.debt_to_equity),
            ("cash_flow_volatility", Rule::NonNegative, &mut self.financial.cash_flow_volatility),
            ("revenue_growth", Rule::Finite, &mut self.operational.revenue_growth),
            ("customer_concentration", Rule::Share, &mut self.operational.customer_concentration),
            ("days_sales_outstanding", Rule::NonNegative, &mut self.operational.days_sales_outstanding),
            ("late_filings", Rule::NonNegative, &mut self.compliance.late_filings),
            ("open_audit_findings", Rule::NonNegative, &mut self.compliance.open_audit_findings),
            ("documentation_completeness", Rule::Share, &mut self.compliance.documentation_completeness),
            ("payment_delay_days", Rule::NonNegative, &mut self.behavioral.payment_delay_days),
            ("engagement_score", Rule::Share, &mut self.behavioral.engagement_score),
            ("response_time_days", Rule::NonNegative, &mut self.behavioral.response_time_days),
            ("industry_growth", Rule::Finite, &mut self.market.industry_growth),
            ("market_volatility", Rule::NonNegative, &mut self.market.market_volatility),
        ]
    }
}

/// The admissible range of one snapshot field.
#[derive(Debug, Clone, Copy)]
enum Rule {
    Finite,
    NonNegative,
    Share,
}

impl Rule {
    fn check(self, field: &'static str, value: Option<f64>) -> Option<RiskError> {
        let v = value?;
        let reason = if !v.is_finite() {
            format!("{v} is not finite")
        } else {
            match self {
                Rule::Finite => return None,
                Rule::NonNegative if v < 0.0 => format!("{v} must not be negative"),
                Rule::Share if !(0.0..=1.0).contains(&v) => format!("{v} is outside [0, 1]"),
                _ => return None,
            }
        };
        Some(RiskError::InvalidInput { field, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, TimeZone, Utc};

    fn monthly(client_id: Uuid, metric: &str, values: &[f64]) -> MetricSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        MetricSeries::from_pairs(
            client_id,
            metric,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start.checked_add_months(Months::new(i as u32)).unwrap(), Some(*v))),
        )
        .unwrap()
    }

    #[test]
    fn builds_from_latest_values_and_derives_growth() {
        let id = Uuid::new_v4();
        let series = vec![
            monthly(id, "current_ratio", &[1.8, 1.2]),
            monthly(id, "net_margin", &[0.04]),
            monthly(id, "revenue", &[100.0, 105.0, 110.0]),
            monthly(id, "cash_flow", &[10.0, 12.0, 8.0, 10.0]),
        ];
        let snapshot = RiskSnapshot::from_series(id, &series);

        assert_eq!(snapshot.financial.current_ratio, Some(1.2));
        assert_eq!(snapshot.financial.profit_margin, Some(0.04));
        assert!((snapshot.operational.revenue_growth.unwrap() - 0.1).abs() < 1e-12);
        assert!(snapshot.financial.cash_flow_volatility.unwrap() > 0.0);
        assert_eq!(snapshot.compliance.late_filings, None);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_shares() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.behavioral.engagement_score = Some(1.4);
        let err = snapshot.validate().unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput { field: "engagement_score", .. }));
    }

    #[test]
    fn sanitizing_clears_only_invalid_values() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.behavioral.engagement_score = Some(75.0);
        snapshot.behavioral.payment_delay_days = Some(12.0);
        snapshot.operational.customer_concentration = Some(1.2);
        snapshot.financial.current_ratio = Some(f64::NAN);

        let (clean, rejected) = snapshot.sanitized();
        assert_eq!(clean.behavioral.engagement_score, None);
        assert_eq!(clean.behavioral.payment_delay_days, Some(12.0));
        assert_eq!(clean.operational.customer_concentration, None);
        assert_eq!(clean.financial.current_ratio, None);
        assert_eq!(rejected.len(), 3);
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn rejects_negative_counts() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.compliance.late_filings = Some(-1.0);
        assert!(snapshot.validate().is_err());
    }
}
