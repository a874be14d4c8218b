//! Secondary-side drip consumption.
//!
//! [`SecondaryReservoir`] is the only writer of issuance rate and base
//! supply on a secondary ledger. It accepts drips strictly in nonce order:
//! a repeat or a skip is rejected with no state change, and a permanently
//! lost message is recoverable only through the governance nonce
//! correction. On each accepted drip the local accumulator is first
//! settled under the old supply and rate, then rebased from the message —
//! the primary's computation is authoritative, so values are overwritten,
//! never merged.
//!
//! The reservoir doubles as the engine's [`SupplySource`] on this ledger:
//! between drips, accrual compounds the last delivered supply snapshot.

use tracing::{info, warn};

use strata_core::constants::FIXED_POINT_SCALE;
use strata_core::error::ReservoirError;
use strata_core::fixedpoint::mul_div;
use strata_core::traits::{SignalOracle, StaticSupply, SupplySource, TokenLedger};
use strata_core::types::Address;
use strata_rewards::RewardsManager;

use crate::message::DripMessage;

/// How an accepted drip's keeper reward was paid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DripReceipt {
    /// Nonce of the accepted message.
    pub nonce: u64,
    /// Grains minted to the message's beneficiary.
    pub beneficiary_share: u128,
    /// Grains minted to the relaying redeemer, if one was involved.
    pub redeemer_share: u128,
}

/// Drip consumption state on a secondary ledger. Singleton.
#[derive(Clone, Debug)]
pub struct SecondaryReservoir {
    governor: Address,
    next_drip_nonce: u64,
    drip_history_block: u64,
    normalized_supply: u128,
    keeper_reward_fraction: u128,
}

impl SecondaryReservoir {
    /// Create a reservoir governed by `governor`.
    ///
    /// `keeper_reward_fraction` is the fixed-point share of each drip's
    /// keeper reward routed to the on-chain redeemer when the delivery was
    /// relayed through one; the remainder always goes to the message's
    /// beneficiary. Supply starts at zero and stays there until the first
    /// drip arrives, so nothing accrues on an unsynchronized ledger.
    pub fn new(
        governor: Address,
        keeper_reward_fraction: u128,
    ) -> Result<Self, ReservoirError> {
        if keeper_reward_fraction > FIXED_POINT_SCALE {
            return Err(ReservoirError::FractionAboveOne {
                fraction: keeper_reward_fraction,
            });
        }
        Ok(Self {
            governor,
            next_drip_nonce: 0,
            drip_history_block: 0,
            normalized_supply: 0,
            keeper_reward_fraction,
        })
    }

    /// Nonce the next accepted drip must carry.
    pub fn next_drip_nonce(&self) -> u64 {
        self.next_drip_nonce
    }

    /// Block of the last accepted drip.
    pub fn drip_history_block(&self) -> u64 {
        self.drip_history_block
    }

    /// Consume a drip message at `current_block`.
    ///
    /// Rejects out-of-order nonces; the caller must report the rejection
    /// to the delivery channel as a failed delivery. On success, settles
    /// the engine's accrual under the pre-drip supply and rate, overwrites
    /// both from the message, advances the expected nonce by exactly 1,
    /// and mints the keeper reward.
    ///
    /// `redeemer` is the on-chain relayer of this particular delivery, if
    /// any; it receives the configured fraction of the keeper reward and
    /// the beneficiary receives the exact remainder, so the two shares
    /// always sum to the message's `keeper_reward` field.
    pub fn receive_drip(
        &mut self,
        manager: &mut RewardsManager,
        curation: &impl SignalOracle,
        ledger: &mut impl TokenLedger,
        message: &DripMessage,
        redeemer: Option<Address>,
        current_block: u64,
    ) -> Result<DripReceipt, ReservoirError> {
        if message.nonce != self.next_drip_nonce {
            warn!(
                expected = self.next_drip_nonce,
                got = message.nonce,
                "reservoir: out-of-order drip rejected"
            );
            return Err(ReservoirError::NonceMismatch {
                expected: self.next_drip_nonce,
                got: message.nonce,
            });
        }
        message.validate()?;

        // Accrual between drips compounds the old base; settle it before
        // the message overwrites supply and rate.
        let old_base = StaticSupply(self.normalized_supply);
        manager.rebase_issuance_rate(&old_base, curation, message.issuance_rate, current_block)?;

        self.normalized_supply = message.normalized_supply;
        self.next_drip_nonce += 1;
        self.drip_history_block = current_block;

        let redeemer_share = match redeemer {
            Some(r) if !r.is_zero() => {
                mul_div(message.keeper_reward, self.keeper_reward_fraction, FIXED_POINT_SCALE)?
            }
            _ => 0,
        };
        let beneficiary_share = message.keeper_reward - redeemer_share;
        if beneficiary_share > 0 {
            ledger.mint(&message.beneficiary, beneficiary_share)?;
        }
        if redeemer_share > 0 {
            // Non-zero checked by the match arm above.
            if let Some(r) = redeemer {
                ledger.mint(&r, redeemer_share)?;
            }
        }
        info!(
            nonce = message.nonce,
            supply = message.normalized_supply,
            rate = message.issuance_rate,
            beneficiary_share,
            redeemer_share,
            block = current_block,
            "reservoir: drip accepted"
        );
        Ok(DripReceipt {
            nonce: message.nonce,
            beneficiary_share,
            redeemer_share,
        })
    }

    /// Governance: redeemer's share of each keeper reward.
    pub fn set_keeper_reward_fraction(
        &mut self,
        caller: &Address,
        fraction: u128,
    ) -> Result<(), ReservoirError> {
        if *caller != self.governor {
            return Err(ReservoirError::NotAuthorized);
        }
        if fraction > FIXED_POINT_SCALE {
            return Err(ReservoirError::FractionAboveOne { fraction });
        }
        self.keeper_reward_fraction = fraction;
        info!(fraction, "reservoir: keeper reward fraction updated");
        Ok(())
    }

    /// Governance: overwrite the expected drip nonce.
    ///
    /// Escape hatch for recovering from a message the delivery channel has
    /// permanently lost.
    pub fn set_next_drip_nonce(
        &mut self,
        caller: &Address,
        nonce: u64,
    ) -> Result<(), ReservoirError> {
        if *caller != self.governor {
            return Err(ReservoirError::NotAuthorized);
        }
        warn!(
            old = self.next_drip_nonce,
            new = nonce,
            "reservoir: drip nonce manually corrected"
        );
        self.next_drip_nonce = nonce;
        Ok(())
    }
}

impl SupplySource for SecondaryReservoir {
    fn total_supply(&self) -> u128 {
        self.normalized_supply
    }
}
