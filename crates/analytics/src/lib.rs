//! # Meridian Analytics
//!
//! Series-level signal processing: cleaning raw metric history and splitting it into
//! trend, seasonal and irregular components.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** A pure logic crate with no knowledge of storage or providers.
//!   It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** `SeriesPreprocessor` and `SeasonalDecomposer` hold only
//!   their parameters. The same input always yields the same output, so they are safe
//!   to share across threads.
//!
//! ## Public API
//!
//! - `SeriesPreprocessor` / `CleanedSeries`: gap-filling, outlier correction, smoothing.
//! - `SeasonalDecomposer` / `Decomposition`: additive LOESS decomposition.
//! - `stats`: the small statistics toolkit shared by the forecasting and benchmark crates.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod decomposition;
pub mod error;
pub mod preprocess;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use decomposition::{Decomposition, SeasonalDecomposer};
pub use error::AnalyticsError;
pub use preprocess::{CleanedSeries, SeriesPreprocessor};
