use crate::score::{EarlyWarning, WarningStatus};
use crate::snapshot::RiskSnapshot;

#[derive(Debug, Clone, Copy)]
enum Worse {
    Lower,
    Higher,
}

struct Threshold {
    name: &'static str,
    worse: Worse,
    warning: f64,
    critical: f64,
}

// A value at the threshold counts as having reached it.
const THRESHOLDS: [Threshold; 6] = [
    Threshold { name: "current_ratio", worse: Worse::Lower, warning: 1.5, critical: 1.0 },
    Threshold { name: "debt_to_equity", worse: Worse::Higher, warning: 2.0, critical: 3.0 },
    Threshold { name: "profit_margin", worse: Worse::Lower, warning: 0.05, critical: 0.0 },
    Threshold { name: "cash_flow_volatility", worse: Worse::Higher, warning: 0.3, critical: 0.5 },
    Threshold { name: "payment_delay_days", worse: Worse::Higher, warning: 30.0, critical: 60.0 },
    Threshold { name: "late_filings", worse: Worse::Higher, warning: 1.0, critical: 3.0 },
];

impl Threshold {
    fn evaluate(&self, value: f64) -> EarlyWarning {
        let reached = |limit: f64| match self.worse {
            Worse::Lower => value <= limit,
            Worse::Higher => value >= limit,
        };
        let (status, threshold) = if reached(self.critical) {
            (WarningStatus::Critical, self.critical)
        } else if reached(self.warning) {
            (WarningStatus::Warning, self.warning)
        } else {
            (WarningStatus::Normal, self.warning)
        };
        EarlyWarning {
            name: self.name.to_string(),
            current_value: value,
            threshold,
            status,
        }
    }
}

fn value_of(name: &str, s: &RiskSnapshot) -> Option<f64> {
    match name {
        "current_ratio" => s.financial.current_ratio,
        "debt_to_equity" => s.financial.debt_to_equity,
        "profit_margin" => s.financial.profit_margin,
        "cash_flow_volatility" => s.financial.cash_flow_volatility,
        "payment_delay_days" => s.behavioral.payment_delay_days,
        "late_filings" => s.compliance.late_filings,
        _ => None,
    }
}

/// Evaluates every indicator whose input is present in the snapshot.
pub fn early_warnings(snapshot: &RiskSnapshot) -> Vec<EarlyWarning> {
    THRESHOLDS
        .iter()
        .filter_map(|t| value_of(t.name, snapshot).map(|v| t.evaluate(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn statuses_follow_thresholds() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.financial.current_ratio = Some(0.9);
        snapshot.financial.debt_to_equity = Some(2.5);
        snapshot.behavioral.payment_delay_days = Some(12.0);

        let warnings = early_warnings(&snapshot);
        assert_eq!(warnings.len(), 3);

        let by_name = |n: &str| warnings.iter().find(|w| w.name == n).unwrap();
        assert_eq!(by_name("current_ratio").status, WarningStatus::Critical);
        assert_eq!(by_name("current_ratio").threshold, 1.0);
        assert_eq!(by_name("debt_to_equity").status, WarningStatus::Warning);
        assert_eq!(by_name("payment_delay_days").status, WarningStatus::Normal);
    }

    #[test]
    fn threshold_value_itself_triggers() {
        let mut snapshot = RiskSnapshot::new(Uuid::new_v4());
        snapshot.compliance.late_filings = Some(1.0);
        snapshot.financial.profit_margin = Some(0.0);

        let warnings = early_warnings(&snapshot);
        assert!(warnings.iter().any(|w| w.name == "late_filings" && w.status == WarningStatus::Warning));
        assert!(warnings.iter().any(|w| w.name == "profit_margin" && w.status == WarningStatus::Critical));
    }
}
