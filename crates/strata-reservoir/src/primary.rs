//! Primary-side drip origination.
//!
//! [`PrimaryReservoir`] reads the primary ledger's supply and the engine's
//! issuance rate, stamps them into a [`DripMessage`], and advances its
//! local nonce. It never writes supply or rate itself. Dripping is a
//! permissionless keeper action; the caller's payoff is minted on the
//! secondary side when the message arrives, so the entry point carries
//! slippage guards that let a keeper abort a transaction that was mined
//! too late to be worth relaying.

use tracing::{info, warn};

use strata_core::constants::{DEFAULT_MIN_DRIP_INTERVAL, FIXED_POINT_SCALE};
use strata_core::error::ReservoirError;
use strata_core::fixedpoint::mul_div;
use strata_core::traits::{SignalOracle, SupplySource};
use strata_core::types::Address;
use strata_rewards::issuance::compound_issuance;
use strata_rewards::RewardsManager;

use crate::message::DripMessage;

/// Drip origination state on the primary ledger. Singleton.
#[derive(Clone, Debug)]
pub struct PrimaryReservoir {
    governor: Address,
    next_drip_nonce: u64,
    drip_history_block: u64,
    normalized_supply: u128,
    drip_reward_fraction: u128,
    min_drip_interval: u64,
}

impl PrimaryReservoir {
    /// Create a reservoir governed by `governor`.
    ///
    /// `drip_reward_fraction` sizes each drip's keeper reward as a
    /// fixed-point fraction of the tokens issued since the previous drip.
    pub fn new(
        governor: Address,
        drip_reward_fraction: u128,
        start_block: u64,
    ) -> Result<Self, ReservoirError> {
        if drip_reward_fraction > FIXED_POINT_SCALE {
            return Err(ReservoirError::FractionAboveOne {
                fraction: drip_reward_fraction,
            });
        }
        Ok(Self {
            governor,
            next_drip_nonce: 0,
            drip_history_block: start_block,
            normalized_supply: 0,
            drip_reward_fraction,
            min_drip_interval: DEFAULT_MIN_DRIP_INTERVAL,
        })
    }

    /// Nonce the next originated drip will carry.
    pub fn next_drip_nonce(&self) -> u64 {
        self.next_drip_nonce
    }

    /// Block of the last successful drip (the start block before any).
    pub fn drip_history_block(&self) -> u64 {
        self.drip_history_block
    }

    /// Supply stamped into the last originated drip.
    pub fn normalized_supply(&self) -> u128 {
        self.normalized_supply
    }

    /// Originate a drip at `current_block`.
    ///
    /// Permissionless. `min_expected_supply`, `min_expected_rate` and
    /// `expected_nonce` are the keeper's slippage guards: a transaction
    /// mined after the state it was built against has moved on is rejected
    /// instead of relaying a snapshot the keeper never priced. All checks
    /// run before any state changes; a rejected drip mutates nothing.
    ///
    /// On success returns the message to hand to the delivery channel and
    /// advances the local nonce by exactly 1.
    #[allow(clippy::too_many_arguments)]
    pub fn drip(
        &mut self,
        manager: &mut RewardsManager,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        min_expected_supply: u128,
        min_expected_rate: u128,
        expected_nonce: u64,
        beneficiary: Address,
        current_block: u64,
    ) -> Result<DripMessage, ReservoirError> {
        if beneficiary.is_zero() {
            return Err(ReservoirError::ZeroBeneficiary);
        }
        if expected_nonce != self.next_drip_nonce {
            return Err(ReservoirError::NonceMismatch {
                expected: self.next_drip_nonce,
                got: expected_nonce,
            });
        }
        if self.next_drip_nonce > 0 {
            let next_allowed = self.drip_history_block + self.min_drip_interval;
            if current_block < next_allowed {
                return Err(ReservoirError::DripTooSoon { next_allowed });
            }
        }
        let total_supply = supply.total_supply();
        if total_supply < min_expected_supply {
            return Err(ReservoirError::SupplyBelowExpected {
                expected: min_expected_supply,
                actual: total_supply,
            });
        }
        let issuance_rate = manager.issuance().rate_per_block;
        if issuance_rate < min_expected_rate {
            return Err(ReservoirError::RateBelowExpected {
                expected: min_expected_rate,
                actual: issuance_rate,
            });
        }

        manager.update_acc_rewards_per_signal(supply, curation, current_block)?;

        let elapsed = current_block.saturating_sub(self.drip_history_block);
        let issued = compound_issuance(total_supply, issuance_rate, elapsed)?;
        let keeper_reward = mul_div(issued, self.drip_reward_fraction, FIXED_POINT_SCALE)?;

        let message = DripMessage {
            nonce: self.next_drip_nonce,
            normalized_supply: total_supply,
            issuance_rate,
            keeper_reward,
            beneficiary,
        };
        self.next_drip_nonce += 1;
        self.drip_history_block = current_block;
        self.normalized_supply = total_supply;
        info!(
            nonce = message.nonce,
            supply = total_supply,
            rate = issuance_rate,
            keeper_reward,
            block = current_block,
            "reservoir: drip originated"
        );
        Ok(message)
    }

    /// Governance: fraction of inter-drip issuance paid to the keeper.
    pub fn set_drip_reward_fraction(
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
        self.drip_reward_fraction = fraction;
        info!(fraction, "reservoir: drip reward fraction updated");
        Ok(())
    }

    /// Governance: minimum number of blocks between drips.
    pub fn set_min_drip_interval(
        &mut self,
        caller: &Address,
        blocks: u64,
    ) -> Result<(), ReservoirError> {
        if *caller != self.governor {
            return Err(ReservoirError::NotAuthorized);
        }
        self.min_drip_interval = blocks;
        info!(blocks, "reservoir: min drip interval updated");
        Ok(())
    }

    /// Governance: overwrite the next drip nonce.
    ///
    /// Escape hatch for recovering from a message the delivery channel has
    /// permanently lost; pairs with the same correction on the secondary.
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

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::constants::GRAIN;
    use strata_core::memory::{MemoryCuration, MemoryLedger};

    const FP: u128 = FIXED_POINT_SCALE;
    const RATE: u128 = FP + 122_722_344_290_393;
    const SUPPLY: u128 = 10_004_000_000 * GRAIN;
    const GOVERNOR: Address = Address([0xEE; 20]);

    fn keeper() -> Address {
        Address::from_bytes([0x42; 20])
    }

    fn world() -> (PrimaryReservoir, RewardsManager, MemoryCuration, MemoryLedger) {
        let reservoir = PrimaryReservoir::new(GOVERNOR, FP / 100, 0).unwrap();
        let manager = RewardsManager::new(GOVERNOR, RATE, 0).unwrap();
        (
            reservoir,
            manager,
            MemoryCuration::new(),
            MemoryLedger::with_supply(Address::from_bytes([0xAA; 20]), SUPPLY),
        )
    }

    #[test]
    fn rejects_fraction_above_one() {
        assert!(matches!(
            PrimaryReservoir::new(GOVERNOR, FP + 1, 0),
            Err(ReservoirError::FractionAboveOne { .. })
        ));
    }

    #[test]
    fn first_drip_stamps_supply_and_rate() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        let msg = reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 4)
            .unwrap();
        assert_eq!(msg.nonce, 0);
        assert_eq!(msg.normalized_supply, SUPPLY);
        assert_eq!(msg.issuance_rate, RATE);
        assert_eq!(msg.beneficiary, keeper());

        let issued = compound_issuance(SUPPLY, RATE, 4).unwrap();
        assert_eq!(msg.keeper_reward, issued / 100);

        assert_eq!(reservoir.next_drip_nonce(), 1);
        assert_eq!(reservoir.drip_history_block(), 4);
        assert_eq!(reservoir.normalized_supply(), SUPPLY);
        // The drip also settled the engine's accumulator.
        assert_eq!(manager.issuance().last_updated_block, 4);
    }

    #[test]
    fn stale_expected_nonce_rejected() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 4)
            .unwrap();
        let err = reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 10_000)
            .unwrap_err();
        assert_eq!(err, ReservoirError::NonceMismatch { expected: 1, got: 0 });
        assert_eq!(reservoir.next_drip_nonce(), 1);
    }

    #[test]
    fn drip_too_soon_rejected() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 10)
            .unwrap();
        let err = reservoir
            .drip(
                &mut manager,
                &ledger,
                &curation,
                0,
                0,
                1,
                keeper(),
                10 + DEFAULT_MIN_DRIP_INTERVAL - 1,
            )
            .unwrap_err();
        assert_eq!(
            err,
            ReservoirError::DripTooSoon {
                next_allowed: 10 + DEFAULT_MIN_DRIP_INTERVAL
            }
        );
        // History untouched by the rejection.
        assert_eq!(reservoir.drip_history_block(), 10);

        reservoir
            .drip(
                &mut manager,
                &ledger,
                &curation,
                0,
                0,
                1,
                keeper(),
                10 + DEFAULT_MIN_DRIP_INTERVAL,
            )
            .unwrap();
        assert_eq!(reservoir.next_drip_nonce(), 2);
    }

    #[test]
    fn slippage_guards_reject_stale_keeper_transactions() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        let err = reservoir
            .drip(&mut manager, &ledger, &curation, SUPPLY + 1, 0, 0, keeper(), 4)
            .unwrap_err();
        assert!(matches!(err, ReservoirError::SupplyBelowExpected { .. }));

        let err = reservoir
            .drip(&mut manager, &ledger, &curation, 0, RATE + 1, 0, keeper(), 4)
            .unwrap_err();
        assert!(matches!(err, ReservoirError::RateBelowExpected { .. }));

        // Neither rejection advanced anything.
        assert_eq!(reservoir.next_drip_nonce(), 0);
        assert_eq!(manager.issuance().last_updated_block, 0);
    }

    #[test]
    fn zero_beneficiary_rejected() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        let err = reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, Address::ZERO, 4)
            .unwrap_err();
        assert_eq!(err, ReservoirError::ZeroBeneficiary);
    }

    #[test]
    fn keeper_reward_scales_with_fraction() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        reservoir
            .set_drip_reward_fraction(&GOVERNOR, FP / 10)
            .unwrap();
        let msg = reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 4)
            .unwrap();
        let issued = compound_issuance(SUPPLY, RATE, 4).unwrap();
        assert_eq!(msg.keeper_reward, issued / 10);
    }

    #[test]
    fn zero_fraction_means_zero_keeper_reward() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        reservoir.set_drip_reward_fraction(&GOVERNOR, 0).unwrap();
        let msg = reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 4)
            .unwrap();
        assert_eq!(msg.keeper_reward, 0);
    }

    #[test]
    fn governance_requires_governor() {
        let (mut reservoir, _, _, _) = world();
        let stranger = Address::from_bytes([1; 20]);
        assert_eq!(
            reservoir.set_drip_reward_fraction(&stranger, 0).unwrap_err(),
            ReservoirError::NotAuthorized
        );
        assert_eq!(
            reservoir.set_min_drip_interval(&stranger, 1).unwrap_err(),
            ReservoirError::NotAuthorized
        );
        assert_eq!(
            reservoir.set_next_drip_nonce(&stranger, 9).unwrap_err(),
            ReservoirError::NotAuthorized
        );
    }

    #[test]
    fn nonce_correction_escape_hatch() {
        let (mut reservoir, mut manager, curation, ledger) = world();
        reservoir
            .drip(&mut manager, &ledger, &curation, 0, 0, 0, keeper(), 4)
            .unwrap();
        reservoir.set_next_drip_nonce(&GOVERNOR, 5).unwrap();
        assert_eq!(reservoir.next_drip_nonce(), 5);
        let msg = reservoir
            .drip(
                &mut manager,
                &ledger,
                &curation,
                0,
                0,
                5,
                keeper(),
                4 + DEFAULT_MIN_DRIP_INTERVAL,
            )
            .unwrap();
        assert_eq!(msg.nonce, 5);
    }
}
