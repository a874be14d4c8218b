//! # strata-rewards — Reward accrual and distribution engine.
//!
//! Continuously mints protocol tokens and distributes them to indexers and
//! their delegators in proportion to dataset signal and allocated tokens,
//! without ever iterating over datasets or allocations:
//! - **Global issuance accumulator**: a lazily-updated
//!   rewards-per-signal index driven by closed-form per-block compounding.
//! - **Per-dataset snapshots**: each dataset rolls its signal-weighted
//!   share of the global index into a running total on signal change.
//! - **Per-allocation density**: dataset totals are attributed to
//!   allocations by a cumulative rewards-per-allocated-token density,
//!   settled when an allocation closes.
//!
//! All arithmetic is integer-only fixed point; all divisions truncate.

pub mod dataset;
pub mod issuance;
pub mod manager;

pub use dataset::DatasetRecord;
pub use issuance::IssuanceState;
pub use manager::{RewardsManager, RewardsOutcome};
