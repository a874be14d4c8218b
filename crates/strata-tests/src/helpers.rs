//! Shared test helpers for integration and property tests.

use strata_core::constants::{FIXED_POINT_SCALE, GRAIN};
use strata_core::memory::{MemoryCuration, MemoryLedger, MemoryStaking};
use strata_core::traits::{StaticSupply, SupplySource};
use strata_core::types::{Address, AllocationId, DatasetId};
use strata_rewards::{RewardsManager, RewardsOutcome};

/// Governor address used across all tests.
pub const GOVERNOR: Address = Address([0xEE; 20]);

/// Per-block rate from the protocol's reference vector:
/// 1.000122722344290393.
pub const TEST_RATE: u128 = FIXED_POINT_SCALE + 122_722_344_290_393;

/// Supply from the protocol's reference vector, in grains.
pub const TEST_SUPPLY: u128 = 10_004_000_000 * GRAIN;

/// Simple address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address::from_bytes([seed; 20])
}

/// Simple dataset id from a seed byte.
pub fn dataset(seed: u8) -> DatasetId {
    DatasetId::from_bytes([seed; 32])
}

/// Simple allocation id from a seed byte.
pub fn alloc(seed: u8) -> AllocationId {
    AllocationId::from_bytes([seed; 32])
}

/// One ledger instance: the engine plus its in-memory collaborators.
///
/// The mutating methods follow the mandatory call-before-mutate
/// discipline: the engine entry point runs first, then the collaborator
/// state changes.
pub struct Harness {
    pub manager: RewardsManager,
    pub curation: MemoryCuration,
    pub staking: MemoryStaking,
    pub ledger: MemoryLedger,
}

impl Harness {
    /// A harness at the reference rate and supply, starting at block 0.
    pub fn new() -> Self {
        Self::with_rate(TEST_RATE)
    }

    /// A harness with a custom issuance rate.
    pub fn with_rate(rate: u128) -> Self {
        Self {
            manager: RewardsManager::new(GOVERNOR, rate, 0).unwrap(),
            curation: MemoryCuration::new(),
            staking: MemoryStaking::new(),
            ledger: MemoryLedger::with_supply(addr(0xAA), TEST_SUPPLY),
        }
    }

    /// Set a dataset's signal at `block`.
    pub fn signal(&mut self, ds: DatasetId, amount: u128, block: u64) {
        self.manager
            .on_signal_change(&self.ledger, &self.curation, ds, block)
            .unwrap();
        self.curation.set_signal(ds, amount);
    }

    /// Open an allocation at `block`.
    pub fn open(
        &mut self,
        id: AllocationId,
        ds: DatasetId,
        indexer: Address,
        tokens: u128,
        block: u64,
    ) {
        let density = self
            .manager
            .on_allocation_open(&self.ledger, &self.curation, &self.staking, ds, block)
            .unwrap();
        self.staking.open_allocation(id, ds, indexer, tokens, density);
    }

    /// Close an allocation at `block`, distributing or burning its rewards.
    pub fn close(&mut self, id: AllocationId, block: u64) -> RewardsOutcome {
        let supply = StaticSupply(self.ledger.total_supply());
        let outcome = self
            .manager
            .on_allocation_close(
                &supply,
                &self.curation,
                &self.staking,
                &mut self.ledger,
                id,
                block,
            )
            .unwrap();
        self.staking.close_allocation(&id);
        outcome
    }

    /// An open allocation's pending rewards projected to `block`.
    pub fn pending(&self, id: AllocationId, block: u64) -> u128 {
        self.manager
            .pending_rewards(&self.ledger, &self.curation, &self.staking, &id, block)
            .unwrap()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
