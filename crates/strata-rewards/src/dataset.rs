//! Per-dataset reward snapshots.
//!
//! Each dataset carries a "density + snapshot baseline" pair at two levels:
//! its share of the global per-signal index (rolled into
//! `acc_rewards_for_dataset` on signal change), and the per-allocated-token
//! density derived from that total (refreshed on allocation change). Both
//! are recomputed lazily from pure projections, so reward queries never
//! iterate over datasets or allocations.

use serde::{Deserialize, Serialize};

use strata_core::constants::FIXED_POINT_SCALE;
use strata_core::error::MathError;
use strata_core::fixedpoint::mul_div;

/// Reward accounting state for one dataset.
///
/// Created lazily on the first signal event and kept forever — a dataset
/// that loses all signal freezes and resumes accrual when signal returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Cumulative rewards ever attributed to this dataset, in grains.
    pub acc_rewards_for_dataset: u128,
    /// Value of `acc_rewards_for_dataset` captured when the allocation
    /// density was last refreshed.
    pub acc_rewards_for_dataset_snapshot: u128,
    /// Global per-signal index value captured at the last signal snapshot.
    pub acc_rewards_per_signal_snapshot: u128,
    /// Cumulative rewards per allocated token, fixed-point. Never
    /// decreased by a refresh.
    pub acc_rewards_per_allocated_token: u128,
    /// When set, rewards are computed normally but burned at distribution.
    pub denied: bool,
}

impl DatasetRecord {
    /// Dataset rewards projected to a given global index value:
    /// the stored total plus `signal * (index - snapshot)`.
    ///
    /// Pure; `signal` must be the signal in force since the last snapshot.
    pub fn accrued_rewards(
        &self,
        signal: u128,
        acc_rewards_per_signal: u128,
    ) -> Result<u128, MathError> {
        let delta = acc_rewards_per_signal.saturating_sub(self.acc_rewards_per_signal_snapshot);
        let share = mul_div(signal, delta, FIXED_POINT_SCALE)?;
        self.acc_rewards_for_dataset
            .checked_add(share)
            .ok_or(MathError::Overflow)
    }

    /// Allocation density projected from a dataset reward total.
    ///
    /// Returns `(density, snapshot_base)`: the cumulative
    /// per-allocated-token density and the reward total it now covers.
    /// With no allocated tokens the density is unchanged — rewards accrued
    /// while nothing was allocated are attributed to nobody, and the
    /// snapshot still moves so they are dropped rather than deferred.
    ///
    /// The density only ever grows; supply-reducing events elsewhere can
    /// never make a later refresh return a smaller value.
    pub fn rewards_per_allocated_token(
        &self,
        accrued_rewards: u128,
        allocated_tokens: u128,
    ) -> Result<(u128, u128), MathError> {
        if allocated_tokens == 0 {
            return Ok((self.acc_rewards_per_allocated_token, accrued_rewards));
        }
        let new_rewards = accrued_rewards.saturating_sub(self.acc_rewards_for_dataset_snapshot);
        let delta = mul_div(new_rewards, FIXED_POINT_SCALE, allocated_tokens)?;
        let density = self
            .acc_rewards_per_allocated_token
            .checked_add(delta)
            .ok_or(MathError::Overflow)?;
        Ok((density, accrued_rewards))
    }
}
