use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether larger values of a metric are favourable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Polarity {
    /// Returns the opposite polarity.
    pub fn inverted(&self) -> Self {
        match self {
            Polarity::HigherIsBetter => Polarity::LowerIsBetter,
            Polarity::LowerIsBetter => Polarity::HigherIsBetter,
        }
    }
}

/// Identifies a forecasting strategy.
///
/// New strategies are added here and in `forecast::create_strategy`; nothing
/// downstream dispatches on strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    TrendExtrapolation,
    ExponentialSmoothing,
    Ensemble,
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelId::TrendExtrapolation => "trend_extrapolation",
            ModelId::ExponentialSmoothing => "exponential_smoothing",
            ModelId::Ensemble => "ensemble",
        };
        f.write_str(name)
    }
}

/// The attribute a peer-group matching criterion filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Industry,
    RevenueSize,
    Geography,
    BusinessModel,
}
