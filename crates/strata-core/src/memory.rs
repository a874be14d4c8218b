//! In-memory collaborator implementations for testing.
//!
//! [`MemoryCuration`], [`MemoryStaking`], and [`MemoryLedger`] implement
//! the trait seams with `HashMap`-backed state and no persistence. They
//! are suitable for tests and simulation; production deployments bind the
//! real curation market, staking registry, and token contract instead.
//!
//! Mutations here deliberately do *not* trigger the engine's entry points:
//! the test (standing in for the collaborator's own transition logic) must
//! call the engine first, then mutate, mirroring the mandatory
//! call-before-mutate discipline of the protocol.

use std::collections::HashMap;

use crate::error::LedgerError;
use crate::traits::{AllocationState, SignalOracle, StakingView, SupplySource, TokenLedger};
use crate::types::{Address, AllocationId, DatasetId};

/// In-memory curation market: per-dataset signal plus the running total.
#[derive(Clone, Debug, Default)]
pub struct MemoryCuration {
    signals: HashMap<DatasetId, u128>,
    total_signalled: u128,
}

impl MemoryCuration {
    /// Create an empty curation market.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a dataset's signal to `amount`, adjusting the total.
    ///
    /// Call the engine's `on_signal_change` *before* this.
    pub fn set_signal(&mut self, dataset: DatasetId, amount: u128) {
        let prev = self.signals.insert(dataset, amount).unwrap_or(0);
        self.total_signalled = self.total_signalled - prev + amount;
    }
}

impl SignalOracle for MemoryCuration {
    fn dataset_signal(&self, dataset: &DatasetId) -> u128 {
        *self.signals.get(dataset).unwrap_or(&0)
    }

    fn total_signalled(&self) -> u128 {
        self.total_signalled
    }
}

/// In-memory staking registry: open allocations and per-dataset totals.
#[derive(Clone, Debug, Default)]
pub struct MemoryStaking {
    allocations: HashMap<AllocationId, AllocationState>,
    allocated: HashMap<DatasetId, u128>,
    reward_cuts: HashMap<Address, u128>,
    destinations: HashMap<Address, Address>,
}

impl MemoryStaking {
    /// Create an empty staking registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly opened allocation.
    ///
    /// `density` is the open-time snapshot returned by the engine's
    /// `on_allocation_open`; call that *before* this.
    pub fn open_allocation(
        &mut self,
        id: AllocationId,
        dataset: DatasetId,
        indexer: Address,
        tokens: u128,
        density: u128,
    ) {
        self.allocations.insert(
            id,
            AllocationState {
                dataset,
                tokens,
                indexer,
                acc_rewards_per_allocated_token: density,
            },
        );
        *self.allocated.entry(dataset).or_insert(0) += tokens;
    }

    /// Retire a closed allocation, releasing its tokens from the dataset
    /// total. Call the engine's `on_allocation_close` *before* this.
    pub fn close_allocation(&mut self, id: &AllocationId) -> Option<AllocationState> {
        let state = self.allocations.remove(id)?;
        if let Some(total) = self.allocated.get_mut(&state.dataset) {
            *total -= state.tokens;
        }
        Some(state)
    }

    /// Set an indexer's delegation reward cut (fixed-point fraction).
    pub fn set_delegation_reward_cut(&mut self, indexer: Address, cut: u128) {
        self.reward_cuts.insert(indexer, cut);
    }

    /// Designate (or clear) an alternate rewards destination for an indexer.
    pub fn set_rewards_destination(&mut self, indexer: Address, destination: Option<Address>) {
        match destination {
            Some(dest) => {
                self.destinations.insert(indexer, dest);
            }
            None => {
                self.destinations.remove(&indexer);
            }
        }
    }
}

impl StakingView for MemoryStaking {
    fn allocation(&self, id: &AllocationId) -> Option<AllocationState> {
        self.allocations.get(id).cloned()
    }

    fn dataset_allocated_tokens(&self, dataset: &DatasetId) -> u128 {
        *self.allocated.get(dataset).unwrap_or(&0)
    }

    fn delegation_reward_cut(&self, indexer: &Address) -> u128 {
        *self.reward_cuts.get(indexer).unwrap_or(&0)
    }

    fn delegation_pool_account(&self, indexer: &Address) -> Address {
        Address::derive("delegation-pool", indexer)
    }

    fn rewards_destination(&self, indexer: &Address) -> Option<Address> {
        self.destinations.get(indexer).copied()
    }
}

/// In-memory token ledger with balances and a total supply.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<Address, u128>,
    supply: u128,
}

impl MemoryLedger {
    /// Create a ledger with an initial supply held by `treasury`.
    pub fn with_supply(treasury: Address, supply: u128) -> Self {
        let mut balances = HashMap::new();
        balances.insert(treasury, supply);
        Self { balances, supply }
    }

    /// Balance of an account in grains.
    pub fn balance_of(&self, account: &Address) -> u128 {
        *self.balances.get(account).unwrap_or(&0)
    }
}

impl SupplySource for MemoryLedger {
    fn total_supply(&self) -> u128 {
        self.supply
    }
}

impl TokenLedger for MemoryLedger {
    fn mint(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::MintToZero);
        }
        self.supply = self
            .supply
            .checked_add(amount)
            .ok_or(LedgerError::SupplyOverflow { amount })?;
        *self.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    fn burn(&mut self, amount: u128) -> Result<(), LedgerError> {
        self.supply = self
            .supply
            .checked_sub(amount)
            .ok_or(LedgerError::BurnExceedsSupply {
                amount,
                supply: self.supply,
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::GRAIN;

    fn addr(seed: u8) -> Address {
        Address::from_bytes([seed; 20])
    }

    fn dataset(seed: u8) -> DatasetId {
        DatasetId::from_bytes([seed; 32])
    }

    // --- MemoryCuration ---

    #[test]
    fn curation_tracks_total() {
        let mut curation = MemoryCuration::new();
        curation.set_signal(dataset(1), 100 * GRAIN);
        curation.set_signal(dataset(2), 50 * GRAIN);
        assert_eq!(curation.total_signalled(), 150 * GRAIN);

        curation.set_signal(dataset(1), 30 * GRAIN);
        assert_eq!(curation.dataset_signal(&dataset(1)), 30 * GRAIN);
        assert_eq!(curation.total_signalled(), 80 * GRAIN);

        curation.set_signal(dataset(2), 0);
        assert_eq!(curation.total_signalled(), 30 * GRAIN);
    }

    #[test]
    fn curation_unknown_dataset_is_zero() {
        let curation = MemoryCuration::new();
        assert_eq!(curation.dataset_signal(&dataset(9)), 0);
        assert_eq!(curation.total_signalled(), 0);
    }

    // --- MemoryStaking ---

    #[test]
    fn staking_tracks_dataset_totals() {
        let mut staking = MemoryStaking::new();
        let a = AllocationId::from_bytes([1; 32]);
        let b = AllocationId::from_bytes([2; 32]);
        staking.open_allocation(a, dataset(1), addr(10), 100 * GRAIN, 0);
        staking.open_allocation(b, dataset(1), addr(11), 40 * GRAIN, 0);
        assert_eq!(staking.dataset_allocated_tokens(&dataset(1)), 140 * GRAIN);

        let closed = staking.close_allocation(&a).unwrap();
        assert_eq!(closed.tokens, 100 * GRAIN);
        assert_eq!(staking.dataset_allocated_tokens(&dataset(1)), 40 * GRAIN);
        assert!(staking.allocation(&a).is_none());
        assert!(staking.allocation(&b).is_some());
    }

    #[test]
    fn staking_destination_roundtrip() {
        let mut staking = MemoryStaking::new();
        assert_eq!(staking.rewards_destination(&addr(1)), None);
        staking.set_rewards_destination(addr(1), Some(addr(2)));
        assert_eq!(staking.rewards_destination(&addr(1)), Some(addr(2)));
        staking.set_rewards_destination(addr(1), None);
        assert_eq!(staking.rewards_destination(&addr(1)), None);
    }

    // --- MemoryLedger ---

    #[test]
    fn ledger_mint_and_burn() {
        let mut ledger = MemoryLedger::with_supply(addr(1), 1000 * GRAIN);
        ledger.mint(&addr(2), 50 * GRAIN).unwrap();
        assert_eq!(ledger.total_supply(), 1050 * GRAIN);
        assert_eq!(ledger.balance_of(&addr(2)), 50 * GRAIN);

        ledger.burn(100 * GRAIN).unwrap();
        assert_eq!(ledger.total_supply(), 950 * GRAIN);
    }

    #[test]
    fn ledger_rejects_mint_to_zero() {
        let mut ledger = MemoryLedger::default();
        assert_eq!(
            ledger.mint(&Address::ZERO, 1),
            Err(LedgerError::MintToZero)
        );
    }

    #[test]
    fn ledger_rejects_overburn() {
        let mut ledger = MemoryLedger::with_supply(addr(1), 10);
        assert!(matches!(
            ledger.burn(11),
            Err(LedgerError::BurnExceedsSupply { .. })
        ));
        // failed burn leaves supply untouched
        assert_eq!(ledger.total_supply(), 10);
    }
}
