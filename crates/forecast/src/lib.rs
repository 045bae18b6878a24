//! # Meridian Forecast Library
//!
//! The forecasting model bank. It defines a universal `ForecastStrategy` trait,
//! several concrete strategies, an inverse-error weighted ensemble, and the scenario
//! generator that turns a baseline forecast into optimistic/pessimistic bands.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** A pure logic crate. It has no knowledge of databases or
//!   providers. It depends only on `core-types`, `analytics` and `configuration`.
//! - **Strategy Agnostic Orchestration:** Higher-level crates work with any
//!   `Box<dyn ForecastStrategy>` without knowing its internals.
//! - **Extensibility:** Adding a strategy means a new module implementing
//!   `ForecastStrategy`, a `ModelId` variant and a line in the `factory`.

// Declare all the modules that constitute this crate.
pub mod bank;
mod calendar;
pub mod ensemble;
pub mod error;
pub mod exponential;
pub mod factory;
pub mod result;
pub mod scenario;
pub mod trend;

// Re-export the key components to create a clean, public-facing API.
pub use bank::ForecastBank;
pub use ensemble::EnsembleStrategy;
pub use error::ForecastError;
pub use exponential::ExponentialSmoothing;
pub use factory::create_strategy;
pub use result::{ForecastPoint, ForecastResult};
pub use scenario::{ScenarioBands, ScenarioGenerator};
pub use trend::TrendExtrapolation;

pub use core_types::ModelId;

use analytics::CleanedSeries;

/// The capability every forecasting strategy provides.
///
/// Implementations are stateless with respect to the data: fitting happens inside the
/// call and nothing is retained, so one instance can serve many series concurrently.
/// The `Send + Sync` bounds let the orchestrator run metrics in parallel.
pub trait ForecastStrategy: Send + Sync {
    fn id(&self) -> ModelId;

    /// Fits the model to `series` and projects `horizon` future periods.
    ///
    /// # Arguments
    ///
    /// * `series` - A cleaned, gap-free series.
    /// * `horizon` - Number of future periods to project.
    /// * `confidence` - Nominal confidence level in `(0, 1)`.
    fn fit_and_forecast(
        &self,
        series: &CleanedSeries,
        horizon: usize,
        confidence: f64,
    ) -> Result<ForecastResult, ForecastError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use analytics::CleanedSeries;
    use chrono::{Months, TimeZone, Utc};
    use core_types::MetricSeries;
    use uuid::Uuid;

    /// A monthly series that is already clean, bypassing the preprocessor.
    pub fn cleaned(metric: &str, values: &[f64]) -> CleanedSeries {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let pairs = values.iter().enumerate().map(|(i, v)| {
            (start.checked_add_months(Months::new(i as u32)).unwrap(), Some(*v))
        });
        let series = MetricSeries::from_pairs(Uuid::new_v4(), metric, pairs).unwrap();
        CleanedSeries {
            series,
            values: values.to_vec(),
            gap_filled: Vec::new(),
            outliers: Vec::new(),
        }
    }
}
