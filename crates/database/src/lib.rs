//! # Meridian Database Crate
//!
//! This crate acts as the application-specific interface to PostgreSQL: the store of
//! client profiles, metric history and the append-only insight log.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate is an adapter that encapsulates all database-specific
//!   logic. The analytics crates never see it; the orchestrator reaches it only through
//!   the `FinancialHistorySource` and `InsightSink` traits it implements.
//! - **Exact Storage, Float Analytics:** Money and ratios are stored as `NUMERIC` and read
//!   as `rust_decimal::Decimal`; conversion to `f64` happens here, at the boundary.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and it uses a
//!   connection pool (`PgPool`) for high-performance, concurrent database access.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded migrations.
//! - `DbRepository`: holds the pool and provides the data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbClient, DbObservation, DbRepository};
