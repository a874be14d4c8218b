//! Global issuance accumulator.
//!
//! [`IssuanceState`] tracks a protocol-wide, monotonically non-decreasing
//! "rewards issued per unit of signal" index, updated lazily from a
//! per-block compounding rate. Nothing accrues eagerly: every mutating
//! entry point of the engine advances this state to "now" first, so the
//! index is exact under arbitrary interleavings of signal changes,
//! allocation changes, and time passing.
//!
//! The central correctness rule: accrual is always computed under the rate
//! that was in effect during each elapsed interval. Rate changes therefore
//! force an update before taking effect (see
//! [`RewardsManager::set_issuance_rate`](crate::manager::RewardsManager::set_issuance_rate)).

use serde::{Deserialize, Serialize};

use strata_core::constants::FIXED_POINT_SCALE;
use strata_core::error::MathError;
use strata_core::fixedpoint::{fixed_pow, mul_div};

/// Tokens issued by compounding `supply` at `rate_per_block` over `elapsed`
/// blocks: `supply * (rate^elapsed - 1)`.
///
/// Shared by the accumulator and the reservoir's keeper-reward sizing.
pub fn compound_issuance(supply: u128, rate_per_block: u128, elapsed: u64) -> Result<u128, MathError> {
    if elapsed == 0 || supply == 0 {
        return Ok(0);
    }
    let growth = fixed_pow(rate_per_block, elapsed, FIXED_POINT_SCALE)?;
    mul_div(
        supply,
        growth.saturating_sub(FIXED_POINT_SCALE),
        FIXED_POINT_SCALE,
    )
}

/// The global issuance accumulator. One per ledger instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceState {
    /// Multiplicative growth per block, fixed-point (1.0 = no issuance).
    pub rate_per_block: u128,
    /// Cumulative rewards per unit of signal, fixed-point. Never decreases.
    pub acc_rewards_per_signal: u128,
    /// Block height the accumulator was last advanced to.
    pub last_updated_block: u64,
}

impl IssuanceState {
    /// Create an accumulator starting at `start_block` with the given rate.
    pub fn new(rate_per_block: u128, start_block: u64) -> Self {
        Self {
            rate_per_block,
            acc_rewards_per_signal: 0,
            last_updated_block: start_block,
        }
    }

    /// Tokens that would be minted between `last_updated_block` and
    /// `current_block` at the configured rate. Pure read, no mutation.
    pub fn new_rewards(&self, total_supply: u128, current_block: u64) -> Result<u128, MathError> {
        if current_block <= self.last_updated_block {
            return Ok(0);
        }
        let elapsed = current_block - self.last_updated_block;
        compound_issuance(total_supply, self.rate_per_block, elapsed)
    }

    /// Pending per-signal index delta: `new_rewards / total_signalled`.
    ///
    /// Exactly 0 when `total_signalled` is 0 — unsignalled intervals are
    /// skipped, never divided by.
    pub fn new_rewards_per_signal(
        &self,
        total_supply: u128,
        total_signalled: u128,
        current_block: u64,
    ) -> Result<u128, MathError> {
        if total_signalled == 0 {
            return Ok(0);
        }
        let rewards = self.new_rewards(total_supply, current_block)?;
        mul_div(rewards, FIXED_POINT_SCALE, total_signalled)
    }

    /// Roll pending rewards into the index and advance to `current_block`.
    ///
    /// Idempotent within a block: a second call at the same height adds 0.
    /// Returns the updated index value.
    pub fn advance(
        &mut self,
        total_supply: u128,
        total_signalled: u128,
        current_block: u64,
    ) -> Result<u128, MathError> {
        let delta = self.new_rewards_per_signal(total_supply, total_signalled, current_block)?;
        self.acc_rewards_per_signal = self
            .acc_rewards_per_signal
            .checked_add(delta)
            .ok_or(MathError::Overflow)?;
        if current_block > self.last_updated_block {
            self.last_updated_block = current_block;
        }
        Ok(self.acc_rewards_per_signal)
    }

    /// The index value projected to `current_block` without mutating.
    pub fn projected(
        &self,
        total_supply: u128,
        total_signalled: u128,
        current_block: u64,
    ) -> Result<u128, MathError> {
        let delta = self.new_rewards_per_signal(total_supply, total_signalled, current_block)?;
        self.acc_rewards_per_signal
            .checked_add(delta)
            .ok_or(MathError::Overflow)
    }
}
