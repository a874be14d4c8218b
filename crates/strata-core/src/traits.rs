//! Trait interfaces between the engine and its collaborators.
//!
//! These traits define the contracts at the engine's boundary:
//! - [`SignalOracle`] — read-only signal weights (curation market implements)
//! - [`StakingView`] — allocation registry reads (staking collaborator implements)
//! - [`SupplySource`] — total token supply (token ledger or reservoir implements)
//! - [`TokenLedger`] — mint/burn primitives (token collaborator implements)
//!
//! The collaborators call into the engine's entry points synchronously as
//! part of their own state transitions; the engine calls back only through
//! these reads plus the ledger's mint/burn. In-memory implementations for
//! testing live in [`memory`](crate::memory).

use crate::error::LedgerError;
use crate::types::{Address, AllocationId, DatasetId};

/// Read-only view of the curation market's signal weights.
pub trait SignalOracle {
    /// Current signal attached to a dataset. Zero for unknown datasets.
    fn dataset_signal(&self, dataset: &DatasetId) -> u128;

    /// Total signal across all datasets (the accrual denominator).
    fn total_signalled(&self) -> u128;
}

/// State of one open allocation, as recorded by the staking collaborator.
///
/// `acc_rewards_per_allocated_token` is the dataset density captured when
/// the allocation opened — the engine returns it from
/// `on_allocation_open` and the staking collaborator stores it here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationState {
    /// Dataset this allocation services.
    pub dataset: DatasetId,
    /// Tokens committed, in grains.
    pub tokens: u128,
    /// The indexer that opened the allocation.
    pub indexer: Address,
    /// Dataset reward density at open time (fixed-point per token).
    pub acc_rewards_per_allocated_token: u128,
}

/// Read-only view of the staking collaborator's allocation registry.
pub trait StakingView {
    /// Look up an open allocation. Returns `None` if unknown or closed.
    fn allocation(&self, id: &AllocationId) -> Option<AllocationState>;

    /// Total tokens currently allocated to a dataset across all open
    /// allocations. The engine relies on being called *before* the staking
    /// collaborator mutates this total.
    fn dataset_allocated_tokens(&self, dataset: &DatasetId) -> u128;

    /// Fraction of an indexer's rewards routed to its delegator pool
    /// (fixed-point, 1.0 = everything).
    fn delegation_reward_cut(&self, indexer: &Address) -> u128;

    /// Account holding the indexer's delegator pool.
    fn delegation_pool_account(&self, indexer: &Address) -> Address;

    /// Alternate destination for the indexer's own share, if designated.
    /// `None` means the share is added to the indexer's stake account.
    fn rewards_destination(&self, indexer: &Address) -> Option<Address>;
}

/// Source of the total token supply used for issuance accrual.
///
/// On the primary ledger this is the token ledger itself; on the secondary
/// ledger it is the reservoir's drip-synchronized supply snapshot.
pub trait SupplySource {
    /// Current total supply in grains.
    fn total_supply(&self) -> u128;
}

/// Token supply primitives the engine delegates mint/burn to.
pub trait TokenLedger: SupplySource {
    /// Mint `amount` grains to `to`, increasing total supply.
    fn mint(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Burn `amount` grains, decreasing total supply.
    fn burn(&mut self, amount: u128) -> Result<(), LedgerError>;
}

/// A fixed supply reading.
///
/// Used when accrual must be settled against a snapshot taken before a
/// mutation — e.g. the secondary reservoir settles under the old
/// drip base before overwriting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticSupply(pub u128);

impl SupplySource for StaticSupply {
    fn total_supply(&self) -> u128 {
        self.0
    }
}
