//! The rewards manager: entry points, distribution, and governance.
//!
//! [`RewardsManager`] owns the global [`IssuanceState`] and the per-dataset
//! records. Every mutating entry point advances the lazy global accumulator
//! as its first step; the curation and staking collaborators must call the
//! corresponding entry point *before* mutating signal or allocated tokens,
//! so snapshots are always taken under pre-change weights.
//!
//! The manager computes reward amounts and delegates the actual mint/burn
//! to the token ledger. Closing an allocation on a denied dataset burns
//! the computed amount instead of minting it, while the dataset's
//! accounting still records the rewards as distributed — accrual continuity
//! is preserved for datasets that are later un-denied.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use strata_core::constants::FIXED_POINT_SCALE;
use strata_core::error::RewardsError;
use strata_core::fixedpoint::mul_div;
use strata_core::traits::{SignalOracle, StakingView, SupplySource, TokenLedger};
use strata_core::types::{Address, AllocationId, DatasetId};

use crate::dataset::DatasetRecord;
use crate::issuance::IssuanceState;

/// What happened to the rewards of a closed allocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardsOutcome {
    /// The dataset was denied: the computed amount was burned.
    Denied {
        /// Amount burned, in grains.
        burned: u128,
    },
    /// Rewards were minted and split.
    Distributed {
        /// Total minted, in grains.
        total: u128,
        /// Share minted to the indexer's delegator pool.
        delegation_pool: u128,
        /// Share minted to the indexer (or its designated destination).
        indexer_share: u128,
        /// Where the indexer share went.
        destination: Address,
    },
}

impl RewardsOutcome {
    /// The computed reward amount, regardless of destination.
    pub fn total(&self) -> u128 {
        match self {
            Self::Denied { burned } => *burned,
            Self::Distributed { total, .. } => *total,
        }
    }
}

/// The reward-accrual and distribution engine. One per ledger instance.
#[derive(Clone, Debug)]
pub struct RewardsManager {
    issuance: IssuanceState,
    datasets: HashMap<DatasetId, DatasetRecord>,
    governor: Address,
    denial_oracle: Option<Address>,
}

impl RewardsManager {
    /// Create a manager governed by `governor`, issuing at `rate_per_block`
    /// from `start_block`.
    pub fn new(
        governor: Address,
        rate_per_block: u128,
        start_block: u64,
    ) -> Result<Self, RewardsError> {
        if rate_per_block < FIXED_POINT_SCALE {
            return Err(RewardsError::RateBelowOne {
                rate: rate_per_block,
            });
        }
        Ok(Self {
            issuance: IssuanceState::new(rate_per_block, start_block),
            datasets: HashMap::new(),
            governor,
            denial_oracle: None,
        })
    }

    /// The global issuance accumulator.
    pub fn issuance(&self) -> &IssuanceState {
        &self.issuance
    }

    /// The record for a dataset, if it has ever been touched.
    pub fn dataset(&self, dataset: &DatasetId) -> Option<&DatasetRecord> {
        self.datasets.get(dataset)
    }

    /// Whether a dataset is currently denied.
    pub fn is_denied(&self, dataset: &DatasetId) -> bool {
        self.datasets.get(dataset).is_some_and(|r| r.denied)
    }

    // ------------------------------------------------------------------
    // Global accumulator
    // ------------------------------------------------------------------

    /// Advance the global per-signal index to `current_block`.
    ///
    /// First statement of every other mutating entry point. Idempotent
    /// within a block. Returns the updated index.
    pub fn update_acc_rewards_per_signal(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let acc = self.issuance.advance(
            supply.total_supply(),
            curation.total_signalled(),
            current_block,
        )?;
        Ok(acc)
    }

    /// Governance: change the per-block issuance rate.
    ///
    /// Forces an update first so the old rate covers every block up to
    /// `current_block`; the new rate only applies from here on. Rejected
    /// calls leave the accumulator untouched.
    pub fn set_issuance_rate(
        &mut self,
        caller: &Address,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        rate_per_block: u128,
        current_block: u64,
    ) -> Result<(), RewardsError> {
        if *caller != self.governor {
            return Err(RewardsError::NotAuthorized);
        }
        if rate_per_block < FIXED_POINT_SCALE {
            return Err(RewardsError::RateBelowOne {
                rate: rate_per_block,
            });
        }
        self.update_acc_rewards_per_signal(supply, curation, current_block)?;
        self.issuance.rate_per_block = rate_per_block;
        info!(rate = rate_per_block, block = current_block, "rewards: issuance rate updated");
        Ok(())
    }

    /// Overwrite the issuance rate from a drip message.
    ///
    /// The drip synchronizer is the only caller of this on a secondary
    /// ledger; the primary's computation is authoritative, so the rate is
    /// replaced, not merged. Accrual up to `current_block` is settled under
    /// the old rate first.
    pub fn rebase_issuance_rate(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        rate_per_block: u128,
        current_block: u64,
    ) -> Result<(), RewardsError> {
        if rate_per_block < FIXED_POINT_SCALE {
            return Err(RewardsError::RateBelowOne {
                rate: rate_per_block,
            });
        }
        self.update_acc_rewards_per_signal(supply, curation, current_block)?;
        self.issuance.rate_per_block = rate_per_block;
        debug!(rate = rate_per_block, block = current_block, "rewards: issuance rate rebased");
        Ok(())
    }

    /// The per-signal index projected to `current_block`. Pure read.
    pub fn acc_rewards_per_signal_at(
        &self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let acc = self.issuance.projected(
            supply.total_supply(),
            curation.total_signalled(),
            current_block,
        )?;
        Ok(acc)
    }

    // ------------------------------------------------------------------
    // Per-dataset snapshots
    // ------------------------------------------------------------------

    /// Snapshot a dataset's share of the global index.
    ///
    /// The curation collaborator must call this immediately *before*
    /// mutating the dataset's signal: the accrued share is weighted by the
    /// signal that existed during the elapsed interval. Idempotent when
    /// signal has not changed. Returns the dataset's updated reward total.
    pub fn on_signal_change(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        dataset: DatasetId,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let acc = self.update_acc_rewards_per_signal(supply, curation, current_block)?;
        let signal = curation.dataset_signal(&dataset);
        let record = self.datasets.entry(dataset).or_default();
        let accrued = record.accrued_rewards(signal, acc)?;
        record.acc_rewards_for_dataset = accrued;
        record.acc_rewards_per_signal_snapshot = acc;
        debug!(%dataset, accrued, block = current_block, "rewards: dataset snapshot");
        Ok(accrued)
    }

    /// A dataset's cumulative rewards projected to `current_block`. Pure
    /// read for UIs and off-chain accounting.
    pub fn dataset_accrued_rewards(
        &self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        dataset: &DatasetId,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let acc = self.acc_rewards_per_signal_at(supply, curation, current_block)?;
        let signal = curation.dataset_signal(dataset);
        let record = self.datasets.get(dataset).copied().unwrap_or_default();
        Ok(record.accrued_rewards(signal, acc)?)
    }

    // ------------------------------------------------------------------
    // Per-allocation snapshots and distribution
    // ------------------------------------------------------------------

    /// Refresh a dataset's allocation density and rebase its snapshot.
    ///
    /// Shared by open and close: snapshots the dataset's signal share,
    /// spreads the delta over the dataset's *current* allocated-token
    /// total, and returns the refreshed cumulative density.
    fn refresh_allocation_density(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        staking: &impl StakingView,
        dataset: DatasetId,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let accrued = self.on_signal_change(supply, curation, dataset, current_block)?;
        let allocated = staking.dataset_allocated_tokens(&dataset);
        let record = self.datasets.entry(dataset).or_default();
        let (density, snapshot_base) = record.rewards_per_allocated_token(accrued, allocated)?;
        record.acc_rewards_per_allocated_token = density;
        record.acc_rewards_for_dataset_snapshot = snapshot_base;
        Ok(density)
    }

    /// Entry point for an allocation opening (or changing size).
    ///
    /// Must be called *before* the staking collaborator adds the new
    /// tokens to the dataset total, so the density delta is spread over
    /// the pre-open total. Returns the density the staking collaborator
    /// must store as the allocation's open-time snapshot.
    pub fn on_allocation_open(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        staking: &impl StakingView,
        dataset: DatasetId,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let density =
            self.refresh_allocation_density(supply, curation, staking, dataset, current_block)?;
        debug!(%dataset, density, block = current_block, "rewards: allocation opened");
        Ok(density)
    }

    /// Entry point for an allocation closing.
    ///
    /// Must be called *before* the staking collaborator releases the
    /// allocation's tokens from the dataset total. Computes the
    /// allocation's reward, then burns it (denied dataset) or mints it
    /// split between the indexer and its delegator pool.
    pub fn on_allocation_close(
        &mut self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        staking: &impl StakingView,
        ledger: &mut impl TokenLedger,
        allocation: AllocationId,
        current_block: u64,
    ) -> Result<RewardsOutcome, RewardsError> {
        let alloc = staking
            .allocation(&allocation)
            .ok_or_else(|| RewardsError::UnknownAllocation(allocation.to_string()))?;
        let density = self.refresh_allocation_density(
            supply,
            curation,
            staking,
            alloc.dataset,
            current_block,
        )?;
        let delta = density.saturating_sub(alloc.acc_rewards_per_allocated_token);
        let rewards = mul_div(alloc.tokens, delta, FIXED_POINT_SCALE)?;

        if self.is_denied(&alloc.dataset) {
            if rewards > 0 {
                ledger.burn(rewards)?;
            }
            warn!(
                dataset = %alloc.dataset,
                %allocation,
                amount = rewards,
                "rewards: denied dataset, rewards burned"
            );
            return Ok(RewardsOutcome::Denied { burned: rewards });
        }

        let cut = staking
            .delegation_reward_cut(&alloc.indexer)
            .min(FIXED_POINT_SCALE);
        let delegation_pool = mul_div(rewards, cut, FIXED_POINT_SCALE)?;
        let indexer_share = rewards - delegation_pool;
        let destination = staking
            .rewards_destination(&alloc.indexer)
            .unwrap_or(alloc.indexer);

        if delegation_pool > 0 {
            ledger.mint(&staking.delegation_pool_account(&alloc.indexer), delegation_pool)?;
        }
        if indexer_share > 0 {
            ledger.mint(&destination, indexer_share)?;
        }
        info!(
            dataset = %alloc.dataset,
            %allocation,
            total = rewards,
            delegation_pool,
            indexer_share,
            "rewards: allocation rewards distributed"
        );
        Ok(RewardsOutcome::Distributed {
            total: rewards,
            delegation_pool,
            indexer_share,
            destination,
        })
    }

    /// An open allocation's pending rewards projected to `current_block`.
    /// Pure read.
    pub fn pending_rewards(
        &self,
        supply: &impl SupplySource,
        curation: &impl SignalOracle,
        staking: &impl StakingView,
        allocation: &AllocationId,
        current_block: u64,
    ) -> Result<u128, RewardsError> {
        let alloc = staking
            .allocation(allocation)
            .ok_or_else(|| RewardsError::UnknownAllocation(allocation.to_string()))?;
        let accrued =
            self.dataset_accrued_rewards(supply, curation, &alloc.dataset, current_block)?;
        let record = self.datasets.get(&alloc.dataset).copied().unwrap_or_default();
        let (density, _) = record.rewards_per_allocated_token(
            accrued,
            staking.dataset_allocated_tokens(&alloc.dataset),
        )?;
        let delta = density.saturating_sub(alloc.acc_rewards_per_allocated_token);
        Ok(mul_div(alloc.tokens, delta, FIXED_POINT_SCALE)?)
    }

    // ------------------------------------------------------------------
    // Governance
    // ------------------------------------------------------------------

    fn authorize_denial(&self, caller: &Address) -> Result<(), RewardsError> {
        if *caller == self.governor || Some(*caller) == self.denial_oracle {
            Ok(())
        } else {
            Err(RewardsError::NotAuthorized)
        }
    }

    /// Deny or un-deny a dataset. Governor or the designated oracle only.
    ///
    /// Denial changes only what happens at distribution time; accrual
    /// continues to be measured identically.
    pub fn set_denied(
        &mut self,
        caller: &Address,
        dataset: DatasetId,
        denied: bool,
    ) -> Result<(), RewardsError> {
        self.authorize_denial(caller)?;
        let record = self.datasets.entry(dataset).or_default();
        record.denied = denied;
        info!(%dataset, denied, "rewards: denial updated");
        Ok(())
    }

    /// Deny or un-deny a batch of datasets in one call.
    pub fn set_denied_many(
        &mut self,
        caller: &Address,
        datasets: &[DatasetId],
        denied: bool,
    ) -> Result<(), RewardsError> {
        self.authorize_denial(caller)?;
        for dataset in datasets {
            let record = self.datasets.entry(*dataset).or_default();
            record.denied = denied;
            info!(%dataset, denied, "rewards: denial updated");
        }
        Ok(())
    }

    /// Governance: designate (or clear) the denial oracle.
    pub fn set_denial_oracle(
        &mut self,
        caller: &Address,
        oracle: Option<Address>,
    ) -> Result<(), RewardsError> {
        if *caller != self.governor {
            return Err(RewardsError::NotAuthorized);
        }
        self.denial_oracle = oracle;
        info!(oracle = ?oracle.map(|a| a.to_string()), "rewards: denial oracle updated");
        Ok(())
    }
}
