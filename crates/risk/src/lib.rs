//! # Meridian Risk Library
//!
//! Multi-category client risk scoring.
//!
//! ## Architectural Principles
//!
//! - **Explicit Input Schema:** The engine never reads loose key/value data. Everything
//!   it looks at arrives in a validated `RiskSnapshot`, which can be assembled from
//!   metric series with `RiskSnapshot::from_series`.
//! - **Fixed Breakpoints:** Each component maps its raw value onto a high, moderate or
//!   low impact through documented breakpoints in `factors`.
//! - **Always Answers:** Missing categories fall back to a neutral score and are
//!   reported, so a valid snapshot always yields a `RiskScore`.
//!
//! ## Public API
//!
//! - `RiskScoringEngine::score`: the entry point.
//! - `CategoryWeights`: the fixed category weights, validated to sum to one.
//! - `RiskScore`, `RiskFactor`, `RiskLevel`, `RiskTrend`, `EarlyWarning`: the output.

pub mod engine;
pub mod error;
pub mod factors;
pub mod score;
pub mod snapshot;
pub mod warnings;

pub use engine::{CategoryWeights, RiskScoringEngine};
pub use error::RiskError;
pub use score::{
    EarlyWarning, RiskCategory, RiskComponent, RiskFactor, RiskLevel, RiskScore, RiskTrend,
    WarningStatus,
};
pub use snapshot::{
    BehavioralInputs, ComplianceInputs, FinancialInputs, MarketInputs, OperationalInputs,
    RiskSnapshot, INPUT_METRICS,
};
