//! End-to-end drip pipeline tests: primary ledger, wire, secondary ledger.
//!
//! Each test runs a real primary instance (engine + reservoir + ledger)
//! and a real secondary instance, moving encoded messages between them the
//! way the delivery channel would.

use strata_core::constants::{FIXED_POINT_SCALE, GRAIN};
use strata_core::error::ReservoirError;
use strata_core::memory::{MemoryCuration, MemoryLedger};
use strata_core::traits::SupplySource;
use strata_reservoir::{DripMessage, PrimaryReservoir, SecondaryReservoir};
use strata_rewards::RewardsManager;
use strata_tests::helpers::{addr, dataset, GOVERNOR, TEST_RATE, TEST_SUPPLY};

const FP: u128 = FIXED_POINT_SCALE;

/// A primary ledger instance: engine, reservoir, collaborators.
struct Primary {
    manager: RewardsManager,
    reservoir: PrimaryReservoir,
    curation: MemoryCuration,
    ledger: MemoryLedger,
}

impl Primary {
    fn new(drip_reward_fraction: u128) -> Self {
        Self {
            manager: RewardsManager::new(GOVERNOR, TEST_RATE, 0).unwrap(),
            reservoir: PrimaryReservoir::new(GOVERNOR, drip_reward_fraction, 0).unwrap(),
            curation: MemoryCuration::new(),
            ledger: MemoryLedger::with_supply(addr(0xAA), TEST_SUPPLY),
        }
    }

    /// Originate a drip and push it through the wire codec.
    fn drip(&mut self, beneficiary: strata_core::types::Address, block: u64) -> Vec<u8> {
        let nonce = self.reservoir.next_drip_nonce();
        let msg = self
            .reservoir
            .drip(
                &mut self.manager,
                &self.ledger,
                &self.curation,
                0,
                0,
                nonce,
                beneficiary,
                block,
            )
            .unwrap();
        msg.encode().unwrap()
    }
}

/// A secondary ledger instance: engine, reservoir, collaborators.
struct Secondary {
    manager: RewardsManager,
    reservoir: SecondaryReservoir,
    curation: MemoryCuration,
    ledger: MemoryLedger,
}

impl Secondary {
    fn new(keeper_reward_fraction: u128) -> Self {
        Self {
            // Idles at rate 1.0 until the first drip arrives.
            manager: RewardsManager::new(GOVERNOR, FP, 0).unwrap(),
            reservoir: SecondaryReservoir::new(GOVERNOR, keeper_reward_fraction).unwrap(),
            curation: MemoryCuration::new(),
            ledger: MemoryLedger::default(),
        }
    }

    fn deliver(
        &mut self,
        wire: &[u8],
        redeemer: Option<strata_core::types::Address>,
        block: u64,
    ) -> Result<strata_reservoir::DripReceipt, ReservoirError> {
        let msg = DripMessage::decode(wire)?;
        self.reservoir.receive_drip(
            &mut self.manager,
            &self.curation,
            &mut self.ledger,
            &msg,
            redeemer,
            block,
        )
    }
}

// ======================================================================
// Happy path: one drip crosses the wire and rebases the secondary.
// ======================================================================

#[test]
fn e2e_drip_synchronizes_secondary() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(FP / 100);
    let mut secondary = Secondary::new(0);

    let wire = primary.drip(keeper, 4);
    let receipt = secondary.deliver(&wire, None, 90).unwrap();

    assert_eq!(receipt.nonce, 0);
    assert_eq!(secondary.reservoir.total_supply(), TEST_SUPPLY);
    assert_eq!(secondary.manager.issuance().rate_per_block, TEST_RATE);
    // Keeper paid on the secondary ledger, not the primary one.
    assert_eq!(secondary.ledger.balance_of(&keeper), receipt.beneficiary_share);
    assert!(receipt.beneficiary_share > 0);
    assert_eq!(primary.ledger.balance_of(&keeper), 0);
}

// ======================================================================
// Accrual between drips uses the last delivered base, and the next drip
// settles it before rebasing.
// ======================================================================

#[test]
fn e2e_secondary_accrues_between_drips() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(0);
    let mut secondary = Secondary::new(0);
    let ds = dataset(1);

    let wire = primary.drip(keeper, 4);
    secondary.deliver(&wire, None, 100).unwrap();

    // Signal on the secondary after the first drip.
    secondary
        .manager
        .on_signal_change(&secondary.reservoir, &secondary.curation, ds, 100)
        .unwrap();
    secondary.curation.set_signal(ds, 50 * GRAIN);

    let accrued_before = secondary
        .manager
        .dataset_accrued_rewards(&secondary.reservoir, &secondary.curation, &ds, 110)
        .unwrap();
    assert!(accrued_before > 0);

    // Second drip arrives; the interval's accrual survives unchanged.
    let wire = primary.drip(keeper, 6_000);
    secondary.deliver(&wire, None, 110).unwrap();
    let accrued_after = secondary
        .manager
        .dataset_accrued_rewards(&secondary.reservoir, &secondary.curation, &ds, 110)
        .unwrap();
    assert_eq!(accrued_after, accrued_before);
}

// ======================================================================
// Ordering across the wire.
// ======================================================================

#[test]
fn e2e_replayed_wire_message_rejected() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(0);
    let mut secondary = Secondary::new(0);

    let wire = primary.drip(keeper, 4);
    secondary.deliver(&wire, None, 100).unwrap();
    let err = secondary.deliver(&wire, None, 101).unwrap_err();
    assert_eq!(err, ReservoirError::NonceMismatch { expected: 1, got: 0 });
    assert_eq!(secondary.reservoir.next_drip_nonce(), 1);
}

#[test]
fn e2e_skipped_message_blocks_delivery_until_corrected() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(0);
    let mut secondary = Secondary::new(0);

    let first = primary.drip(keeper, 4);
    let second = primary.drip(keeper, 6_000);
    let third = primary.drip(keeper, 12_000);

    secondary.deliver(&first, None, 100).unwrap();
    // Message 1 lost in transit; 2 cannot jump the queue.
    let err = secondary.deliver(&third, None, 200).unwrap_err();
    assert_eq!(err, ReservoirError::NonceMismatch { expected: 1, got: 2 });

    // Late arrival of 1 still works...
    secondary.deliver(&second, None, 210).unwrap();
    // ...and 2 follows.
    secondary.deliver(&third, None, 220).unwrap();
    assert_eq!(secondary.reservoir.next_drip_nonce(), 3);
}

#[test]
fn e2e_lost_message_recovered_by_nonce_correction() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(0);
    let mut secondary = Secondary::new(0);

    let first = primary.drip(keeper, 4);
    let _lost = primary.drip(keeper, 6_000);
    let third = primary.drip(keeper, 12_000);

    secondary.deliver(&first, None, 100).unwrap();
    secondary.reservoir.set_next_drip_nonce(&GOVERNOR, 2).unwrap();
    let receipt = secondary.deliver(&third, None, 200).unwrap();
    assert_eq!(receipt.nonce, 2);
}

// ======================================================================
// Keeper economics across the wire.
// ======================================================================

#[test]
fn e2e_redeemer_split_sums_to_wire_amount() {
    let keeper = addr(0x42);
    let redeemer = addr(0x43);
    let mut primary = Primary::new(FP / 100);
    let mut secondary = Secondary::new(FP / 3);

    let wire = primary.drip(keeper, 4);
    let sent = DripMessage::decode(&wire).unwrap();
    let receipt = secondary.deliver(&wire, Some(redeemer), 100).unwrap();

    assert_eq!(
        receipt.beneficiary_share + receipt.redeemer_share,
        sent.keeper_reward
    );
    assert_eq!(secondary.ledger.total_supply(), sent.keeper_reward);
    assert_eq!(secondary.ledger.balance_of(&keeper), receipt.beneficiary_share);
    assert_eq!(secondary.ledger.balance_of(&redeemer), receipt.redeemer_share);
}

#[test]
fn e2e_corrupted_wire_bytes_rejected() {
    let keeper = addr(0x42);
    let mut primary = Primary::new(0);
    let mut secondary = Secondary::new(0);

    let mut wire = primary.drip(keeper, 4);
    wire[0] ^= 0xFF;
    let err = secondary.deliver(&wire, None, 100).unwrap_err();
    assert!(matches!(err, ReservoirError::Codec(_)));
    assert_eq!(secondary.reservoir.next_drip_nonce(), 0);
}
