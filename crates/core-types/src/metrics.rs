//! The metric catalogue: canonical names and their static properties.
//!
//! Names not listed here are treated as higher-is-better and signed.

use crate::enums::Polarity;

pub const REVENUE: &str = "revenue";
pub const CASH_FLOW: &str = "cash_flow";
pub const CASH_BALANCE: &str = "cash_balance";
pub const EXPENSES: &str = "expenses";
pub const CURRENT_RATIO: &str = "current_ratio";
pub const PROFIT_MARGIN: &str = "profit_margin";
pub const NET_MARGIN: &str = "net_margin";
pub const DEBT_TO_EQUITY: &str = "debt_to_equity";
pub const CASH_FLOW_VOLATILITY: &str = "cash_flow_volatility";
pub const RETURN_ON_ASSETS: &str = "return_on_assets";
pub const REVENUE_GROWTH: &str = "revenue_growth";
pub const CUSTOMER_CONCENTRATION: &str = "customer_concentration";
pub const DAYS_SALES_OUTSTANDING: &str = "days_sales_outstanding";
pub const LATE_FILINGS: &str = "late_filings";
pub const OPEN_AUDIT_FINDINGS: &str = "open_audit_findings";
pub const DOCUMENTATION_COMPLETENESS: &str = "documentation_completeness";
pub const PAYMENT_DELAY_DAYS: &str = "payment_delay_days";
pub const ENGAGEMENT_SCORE: &str = "engagement_score";
pub const RESPONSE_TIME_DAYS: &str = "response_time_days";
pub const INDUSTRY_GROWTH: &str = "industry_growth";
pub const MARKET_VOLATILITY: &str = "market_volatility";

const LOWER_IS_BETTER: &[&str] = &[
    EXPENSES,
    DEBT_TO_EQUITY,
    CASH_FLOW_VOLATILITY,
    CUSTOMER_CONCENTRATION,
    DAYS_SALES_OUTSTANDING,
    LATE_FILINGS,
    OPEN_AUDIT_FINDINGS,
    PAYMENT_DELAY_DAYS,
    RESPONSE_TIME_DAYS,
    MARKET_VOLATILITY,
];

const NON_NEGATIVE: &[&str] = &[
    REVENUE,
    CASH_BALANCE,
    EXPENSES,
    CURRENT_RATIO,
    DEBT_TO_EQUITY,
    CASH_FLOW_VOLATILITY,
    CUSTOMER_CONCENTRATION,
    DAYS_SALES_OUTSTANDING,
    LATE_FILINGS,
    OPEN_AUDIT_FINDINGS,
    DOCUMENTATION_COMPLETENESS,
    PAYMENT_DELAY_DAYS,
    ENGAGEMENT_SCORE,
    RESPONSE_TIME_DAYS,
    MARKET_VOLATILITY,
];

pub fn polarity_of(metric: &str) -> Polarity {
    if LOWER_IS_BETTER.contains(&metric) {
        Polarity::LowerIsBetter
    } else {
        Polarity::HigherIsBetter
    }
}

pub fn is_non_negative(metric: &str) -> bool {
    NON_NEGATIVE.contains(&metric)
}

/// Human-readable label, e.g. `days_sales_outstanding` -> `Days sales outstanding`.
pub fn display_name(metric: &str) -> String {
    let spaced = metric.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_metrics_default_to_higher_is_better() {
        assert_eq!(polarity_of("some_new_metric"), Polarity::HigherIsBetter);
        assert!(!is_non_negative("some_new_metric"));
    }

    #[test]
    fn display_name_capitalises() {
        assert_eq!(display_name(DAYS_SALES_OUTSTANDING), "Days sales outstanding");
        assert_eq!(display_name(""), "");
    }
}
