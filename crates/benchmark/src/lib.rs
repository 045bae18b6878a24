//! # Meridian Benchmark Library
//!
//! Positions a client against industry and peer distributions.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** No I/O. Distributions arrive from a `BenchmarkProvider` (or are
//!   built from peer values with `peer_distribution`) and client profiles are passed in.
//! - **Five-Bucket Ranks:** A value is ranked 25, 50, 75, 90 or 95 by the first
//!   percentile anchor it does not exceed. The coarse buckets are what dashboards and
//!   downstream scoring consume.
//! - **Transparent Relaxation:** When a peer cohort is too small the selector loosens
//!   its criteria one step at a time and records every step, so callers can explain
//!   how the cohort was formed.
//!
//! ## Public API
//!
//! - `BenchmarkComparator`: `compare` for one metric, `compare_portfolio` for all.
//! - `PeerGroupSelector`: `select` builds a `PeerGroup` from candidate profiles.
//! - `BenchmarkError`: the specific error types that can be returned from this crate.

pub mod comparator;
pub mod error;
pub mod peer_group;

pub use comparator::{
    peer_distribution, percentile_rank, BenchmarkComparator, BenchmarkComparison,
    CompetitivePosition, PerformanceTier, PortfolioComparison,
};
pub use error::BenchmarkError;
pub use peer_group::{MatchCriterion, PeerGroup, PeerGroupSelector, PeerMember, RelaxationStep};
